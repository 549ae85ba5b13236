//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building the shared HTTP client with the crawler identity
//! - HEAD reachability probes used for seeding
//! - GET requests with retry and backoff on transport failures
//! - Status and Content-Type gating

use crate::config::UserAgentConfig;
use crate::CrawlError;
use reqwest::{header::CONTENT_TYPE, redirect::Policy, Client, Response};
use std::time::Duration;
use url::Url;

/// Maximum redirect hops followed for a single request
const MAX_REDIRECTS: usize = 10;

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The user agent configuration
/// * `timeout` - Per-request timeout applied to every call
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
///
/// # Example
///
/// ```no_run
/// use category_crawler::config::UserAgentConfig;
/// use category_crawler::crawler::build_http_client;
/// use std::time::Duration;
///
/// let config = UserAgentConfig {
///     crawler_name: "CategoryCrawler".to_string(),
///     crawler_version: "1.0".to_string(),
///     contact_url: None,
///     contact_email: None,
/// };
///
/// let client = build_http_client(&config, Duration::from_secs(8)).unwrap();
/// ```
pub fn build_http_client(
    config: &UserAgentConfig,
    timeout: Duration,
) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.header_value())
        .timeout(timeout)
        .connect_timeout(timeout)
        .redirect(Policy::limited(MAX_REDIRECTS))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Sends a HEAD request and reports whether the URL answered with 2xx or 3xx
pub async fn probe_reachable(client: &Client, url: &Url) -> bool {
    match client.head(url.clone()).send().await {
        Ok(response) => {
            let status = response.status();
            let reachable = status.is_success() || status.is_redirection();
            tracing::debug!("Probe {} -> {}", url, status);
            reachable
        }
        Err(e) => {
            tracing::debug!("Probe {} failed: {}", url, e);
            false
        }
    }
}

/// Retry budget and backoff schedule for page fetches
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Extra attempts after the first one
    pub max_retries: u32,

    /// Unit of the quadratic backoff
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, base_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
        }
    }

    /// Total number of attempts a fetch may make
    pub fn attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Wait before the attempt following `attempt` (zero-based)
    ///
    /// `(attempt + 1)^2 * base_delay`, strictly increasing for a non-zero base.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let step = attempt.saturating_add(1);
        let factor = step.saturating_mul(step);
        self.base_delay.saturating_mul(factor)
    }
}

/// An accepted response whose body has not been read yet
#[derive(Debug)]
pub struct FetchedPage {
    /// Final URL after redirects
    pub final_url: Url,

    response: Response,
}

impl FetchedPage {
    /// Reads the whole body as text, consuming the response
    pub async fn into_body(self) -> Result<String, CrawlError> {
        let url = self.final_url.to_string();
        self.response
            .text()
            .await
            .map_err(|e| CrawlError::ParseFailed {
                url,
                message: format!("failed to read body: {}", e),
            })
    }
}

/// Fetches a page with retry on transport errors
///
/// # Retry Logic
///
/// | Condition | Action |
/// |-----------|--------|
/// | Transport error (connect, timeout, TLS) | Retry with backoff |
/// | Status outside 200..400 | Immediate `FetchRejected` |
/// | Content-Type without `html` | Immediate `FetchRejected` |
///
/// Backoff only happens between attempts; exhausting the budget returns
/// `FetchFailed` carrying the last transport error.
///
/// # Arguments
///
/// * `client` - The HTTP client to use
/// * `url` - The URL to fetch
/// * `policy` - Retry budget and backoff
pub async fn fetch_page(
    client: &Client,
    url: &Url,
    policy: &RetryPolicy,
) -> Result<FetchedPage, CrawlError> {
    let attempts = policy.attempts();
    let mut attempt = 0;

    loop {
        match client.get(url.clone()).send().await {
            Ok(response) => return accept_response(url, response),
            Err(e) => {
                attempt += 1;
                if attempt >= attempts {
                    return Err(CrawlError::FetchFailed {
                        url: url.to_string(),
                        attempts,
                        source: e,
                    });
                }

                let wait = policy.backoff(attempt - 1);
                tracing::debug!(
                    "Fetch {} failed (attempt {}/{}): {}; retrying in {:?}",
                    url,
                    attempt,
                    attempts,
                    e,
                    wait
                );
                tokio::time::sleep(wait).await;
            }
        }
    }
}

fn accept_response(url: &Url, response: Response) -> Result<FetchedPage, CrawlError> {
    let status = response.status();
    if !(200..400).contains(&status.as_u16()) {
        return Err(CrawlError::FetchRejected {
            url: url.to_string(),
            reason: format!("status {}", status),
        });
    }

    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_ascii_lowercase();

    if !is_html(&content_type) {
        return Err(CrawlError::FetchRejected {
            url: url.to_string(),
            reason: format!("content type '{}' is not HTML", content_type),
        });
    }

    Ok(FetchedPage {
        final_url: response.url().clone(),
        response,
    })
}

fn is_html(content_type: &str) -> bool {
    content_type.contains("html")
}
