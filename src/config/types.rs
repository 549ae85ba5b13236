use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

/// Main configuration structure for the crawler
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Optional JSON file mapping category names to domain lists
    #[serde(rename = "categories-file", default)]
    pub categories_file: Option<PathBuf>,

    #[serde(default)]
    pub crawler: CrawlerConfig,

    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,

    pub output: OutputConfig,

    /// Category name to ordered list of domains
    #[serde(default)]
    pub categories: BTreeMap<String, Vec<String>>,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Maximum number of pages crawled per domain
    #[serde(rename = "max-pages-per-domain", default = "default_max_pages_per_domain")]
    pub max_pages_per_domain: usize,

    /// Timeout applied to every outbound request (milliseconds)
    #[serde(rename = "request-timeout-ms", default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,

    /// Minimum spacing between requests to the same domain (milliseconds)
    #[serde(rename = "politeness-delay-ms", default = "default_politeness_delay_ms")]
    pub politeness_delay_ms: u64,

    /// Concurrent fetch workers within one domain crawl
    #[serde(rename = "max-workers-per-domain", default = "default_max_workers_per_domain")]
    pub max_workers_per_domain: usize,

    /// Concurrent domain crawls across the whole run
    #[serde(rename = "max-global-workers", default = "default_max_global_workers")]
    pub max_global_workers: usize,

    /// Extra attempts after a failed fetch
    #[serde(rename = "max-retries", default = "default_max_retries")]
    pub max_retries: u32,

    /// Base unit of the retry backoff (milliseconds)
    #[serde(rename = "retry-base-delay-ms", default = "default_retry_base_delay_ms")]
    pub retry_base_delay_ms: u64,

    /// Capacity of the per-domain frontier queue
    #[serde(rename = "queue-capacity", default = "default_queue_capacity")]
    pub queue_capacity: usize,

    /// How long the coordinating loop waits on an empty queue before
    /// re-checking its termination conditions (milliseconds)
    #[serde(rename = "idle-timeout-ms", default = "default_idle_timeout_ms")]
    pub idle_timeout_ms: u64,
}

impl CrawlerConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn politeness_delay(&self) -> Duration {
        Duration::from_millis(self.politeness_delay_ms)
    }

    pub fn retry_base_delay(&self) -> Duration {
        Duration::from_millis(self.retry_base_delay_ms)
    }

    pub fn idle_timeout(&self) -> Duration {
        Duration::from_millis(self.idle_timeout_ms)
    }
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_pages_per_domain: default_max_pages_per_domain(),
            request_timeout_ms: default_request_timeout_ms(),
            politeness_delay_ms: default_politeness_delay_ms(),
            max_workers_per_domain: default_max_workers_per_domain(),
            max_global_workers: default_max_global_workers(),
            max_retries: default_max_retries(),
            retry_base_delay_ms: default_retry_base_delay_ms(),
            queue_capacity: default_queue_capacity(),
            idle_timeout_ms: default_idle_timeout_ms(),
        }
    }
}

fn default_max_pages_per_domain() -> usize {
    50
}

fn default_request_timeout_ms() -> u64 {
    8_000
}

fn default_politeness_delay_ms() -> u64 {
    800
}

fn default_max_workers_per_domain() -> usize {
    4
}

fn default_max_global_workers() -> usize {
    16
}

fn default_max_retries() -> u32 {
    2
}

fn default_retry_base_delay_ms() -> u64 {
    200
}

fn default_queue_capacity() -> usize {
    1024
}

fn default_idle_timeout_ms() -> u64 {
    500
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the crawler, also the robots.txt product token
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url", default)]
    pub contact_url: Option<String>,

    /// Email address for crawler-related contact
    #[serde(rename = "contact-email", default)]
    pub contact_email: Option<String>,
}

impl UserAgentConfig {
    /// Formats the `User-Agent` header value
    ///
    /// Format: `CrawlerName/Version`, followed by ` (+ContactURL; ContactEmail)`
    /// when contact details are configured.
    pub fn header_value(&self) -> String {
        let product = format!("{}/{}", self.crawler_name, self.crawler_version);
        let contact: Vec<String> = [
            self.contact_url.as_ref().map(|u| format!("+{}", u)),
            self.contact_email.clone(),
        ]
        .into_iter()
        .flatten()
        .collect();

        if contact.is_empty() {
            product
        } else {
            format!("{} ({})", product, contact.join("; "))
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path to the SQLite database file
    #[serde(rename = "database-path")]
    pub database_path: String,

    /// Optional log file mirrored alongside console output
    #[serde(rename = "log-path", default)]
    pub log_path: Option<String>,
}
