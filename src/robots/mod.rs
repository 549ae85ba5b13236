//! Robots.txt handling module
//!
//! This module fetches a domain's robots.txt and resolves it into the rule
//! group that applies to the crawler's identity.

mod parser;

pub use parser::RobotsGroup;

use crate::url::CrawlScope;
use crate::CrawlError;
use reqwest::Client;

/// Fetches robots.txt for a domain
///
/// Tries `https://domain/robots.txt` first and falls back to
/// `http://domain/robots.txt` on any transport failure. A status of 400 or
/// above, or an unreadable body, yields `CrawlError::RobotsUnavailable`;
/// callers treat that as allow-all.
///
/// # Arguments
///
/// * `client` - HTTP client carrying the crawler identity and timeout
/// * `scope` - The domain being crawled
/// * `agent` - The product token to resolve rule groups for
///
/// # Returns
///
/// * `Ok(RobotsGroup)` - Successfully fetched robots.txt
/// * `Err(CrawlError)` - robots.txt could not be obtained
pub async fn fetch_robots_group(
    client: &Client,
    scope: &CrawlScope,
    agent: &str,
) -> Result<RobotsGroup, CrawlError> {
    let unavailable = |reason: String| CrawlError::RobotsUnavailable {
        domain: scope.authority(),
        reason,
    };

    let https_url = scope.url_for("https", "/robots.txt")?;
    let response = match client.get(https_url.clone()).send().await {
        Ok(response) => response,
        Err(e) => {
            tracing::debug!("Fetching {} failed ({}), falling back to http", https_url, e);
            let http_url = scope.url_for("http", "/robots.txt")?;
            client
                .get(http_url)
                .send()
                .await
                .map_err(|e| unavailable(e.to_string()))?
        }
    };

    let status = response.status();
    if status.as_u16() >= 400 {
        return Err(unavailable(format!("robots.txt returned status {}", status)));
    }

    let final_url = response.url().to_string();
    let content = response
        .text()
        .await
        .map_err(|e| unavailable(format!("failed to read body: {}", e)))?;

    tracing::debug!("Loaded robots.txt from {} ({} bytes)", final_url, content.len());

    Ok(RobotsGroup::from_content(&content, agent))
}
