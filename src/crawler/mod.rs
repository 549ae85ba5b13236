//! Crawler module for web page fetching and processing
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching with retry logic
//! - HTML parsing and link extraction
//! - Frontier queue, visited set and request pacing
//! - Per-domain crawl coordination and job scheduling

mod coordinator;
mod fetcher;
mod frontier;
mod parser;
mod rate_limit;
mod scheduler;

pub use coordinator::{DomainCrawl, DomainReport};
pub use fetcher::{build_http_client, fetch_page, probe_reachable, FetchedPage, RetryPolicy};
pub use frontier::{EnqueueOutcome, Frontier};
pub use parser::{collapse_whitespace, extract_page, ExtractedPage, FALLBACK_TITLE};
pub use rate_limit::RateLimiter;
pub use scheduler::{expand_jobs, Job, JobScheduler, RunSummary};
