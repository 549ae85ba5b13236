//! Category Crawler: a polite, bounded-concurrency category crawler
//!
//! This crate crawls configured domains per category, extracts title and
//! snippet metadata for every page it visits, and persists the results,
//! while respecting robots.txt, a per-domain politeness delay and strict
//! concurrency and page limits.

pub mod config;
pub mod crawler;
pub mod output;
pub mod robots;
pub mod state;
pub mod storage;
pub mod url;

use std::sync::Arc;
use thiserror::Error;

/// Main error type for crawl operations
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("No seed URL reachable for domain {domain}")]
    SeedUnreachable { domain: String },

    #[error("robots.txt unavailable for {domain}: {reason}")]
    RobotsUnavailable { domain: String, reason: String },

    #[error("Fetch failed for {url} after {attempts} attempts: {source}")]
    FetchFailed {
        url: String,
        attempts: u32,
        source: reqwest::Error,
    },

    #[error("Fetch rejected for {url}: {reason}")]
    FetchRejected { url: String, reason: String },

    #[error("HTML parse error for {url}: {message}")]
    ParseFailed { url: String, message: String },

    #[error("Failed to persist {url}: {source}")]
    PersistFailed {
        url: String,
        source: storage::StorageError,
    },

    #[error("Crawl cancelled")]
    Cancelled,

    #[error("URL error: {0}")]
    Url(#[from] UrlError),

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to parse categories file: {0}")]
    Categories(#[from] serde_json::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid domain pattern: {0}")]
    InvalidPattern(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing domain in URL")]
    MissingDomain,
}

/// Result type alias for crawl operations
pub type Result<T> = std::result::Result<T, CrawlError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

/// Everything a crawl needs that lives for the whole run
///
/// Built once at startup and shared by `Arc` with the scheduler, every
/// domain crawl, the fetcher and the robots resolver. Nothing in the crate
/// reaches for process-wide globals.
pub struct CrawlContext {
    /// Crawl limits and timings
    pub settings: config::CrawlerConfig,

    /// Full `User-Agent` header value
    pub user_agent: String,

    /// Product token matched against robots.txt groups
    pub robots_agent: String,

    /// Shared HTTP client carrying the identity header and request timeout
    pub client: reqwest::Client,

    /// Persistence sink for crawled pages
    pub store: Arc<dyn storage::PageStore>,
}

impl CrawlContext {
    /// Builds a context from configuration and a persistence sink
    pub fn new(
        settings: config::CrawlerConfig,
        user_agent: &config::UserAgentConfig,
        store: Arc<dyn storage::PageStore>,
    ) -> Result<Self> {
        let client = crawler::build_http_client(user_agent, settings.request_timeout())?;

        Ok(Self {
            settings,
            user_agent: user_agent.header_value(),
            robots_agent: user_agent.crawler_name.clone(),
            client,
            store,
        })
    }
}

// Re-export commonly used types
pub use config::Config;
pub use crawler::{DomainCrawl, DomainReport, Job, JobScheduler, RunSummary};
pub use state::{CrawlPhase, CrawlState};
pub use storage::{Page, PageStore, SqliteStorage};
