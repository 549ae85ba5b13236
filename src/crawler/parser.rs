//! HTML parser for extracting links and metadata
//!
//! This module handles parsing HTML content to extract:
//! - Page title
//! - A short snippet (meta description or first paragraph)
//! - In-scope links to follow

use crate::url::{resolve_link, CrawlScope};
use scraper::{Html, Selector};
use std::collections::HashSet;
use url::Url;

/// Title used when a page has no usable `<title>`
pub const FALLBACK_TITLE: &str = "No Title";

/// Extracted information from an HTML page
#[derive(Debug, Clone)]
pub struct ExtractedPage {
    /// Whitespace-collapsed `<title>` text, or the fallback title
    pub title: String,

    /// Meta description, or the first paragraph's text; may be empty
    pub snippet: String,

    /// In-scope absolute links without fragments, deduplicated in
    /// document order
    pub links: Vec<Url>,
}

/// Parses HTML content and extracts title, snippet and links
///
/// # Link Extraction Rules
///
/// **Include:**
/// - `<a href="...">` tags anywhere in the document
///
/// **Exclude:**
/// - `<a href="..." download>`
/// - `javascript:`, `mailto:`, `tel:` links and data URIs
/// - Fragment-only links
/// - Links whose host is outside the crawl scope
///
/// **Note:** `rel="nofollow"` links ARE followed
///
/// # Arguments
///
/// * `html` - The HTML content to parse
/// * `final_url` - The URL the page was served from, after redirects
/// * `scope` - The domain the crawl is confined to
///
/// # Example
///
/// ```
/// use category_crawler::crawler::extract_page;
/// use category_crawler::url::CrawlScope;
/// use url::Url;
///
/// let html = r#"<html><head><title>Test</title></head><body><a href="/page">Link</a></body></html>"#;
/// let final_url = Url::parse("https://example.com/").unwrap();
/// let scope = CrawlScope::parse("example.com").unwrap();
/// let page = extract_page(html, &final_url, &scope);
/// assert_eq!(page.title, "Test");
/// assert_eq!(page.links.len(), 1);
/// ```
pub fn extract_page(html: &str, final_url: &Url, scope: &CrawlScope) -> ExtractedPage {
    let document = Html::parse_document(html);

    let title = extract_title(&document).unwrap_or_else(|| FALLBACK_TITLE.to_string());
    let snippet = extract_snippet(&document);
    let links = extract_links(&document, final_url, scope);

    ExtractedPage {
        title,
        snippet,
        links,
    }
}

/// Collapses every run of whitespace into a single space and trims the ends
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn extract_title(document: &Html) -> Option<String> {
    let selector = Selector::parse("title").ok()?;

    document
        .select(&selector)
        .next()
        .map(|element| collapse_whitespace(&element.text().collect::<String>()))
        .filter(|s| !s.is_empty())
}

fn extract_snippet(document: &Html) -> String {
    // A present description attribute wins even when it is blank
    if let Ok(selector) = Selector::parse(r#"meta[name="description"]"#) {
        if let Some(content) = document
            .select(&selector)
            .find_map(|element| element.value().attr("content"))
        {
            return collapse_whitespace(content);
        }
    }

    Selector::parse("p")
        .ok()
        .and_then(|selector| {
            document
                .select(&selector)
                .next()
                .map(|element| collapse_whitespace(&element.text().collect::<String>()))
        })
        .unwrap_or_default()
}

fn extract_links(document: &Html, final_url: &Url, scope: &CrawlScope) -> Vec<Url> {
    let Ok(selector) = Selector::parse("a[href]") else {
        return Vec::new();
    };

    let mut seen = HashSet::new();
    let mut links = Vec::new();

    for element in document.select(&selector) {
        if element.value().attr("download").is_some() {
            continue;
        }

        let Some(href) = element.value().attr("href") else {
            continue;
        };

        let Some(url) = resolve_link(href, final_url) else {
            continue;
        };

        if scope.contains(&url) && seen.insert(url.to_string()) {
            links.push(url);
        }
    }

    links
}
