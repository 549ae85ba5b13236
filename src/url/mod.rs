//! URL handling module
//!
//! This module provides URL normalization, link resolution, and the domain
//! matching that keeps every crawl confined to its domain and subdomains.

mod domain;
mod matcher;
mod normalize;

// Re-export main functions
pub use domain::{extract_domain, CrawlScope};
pub use matcher::matches_domain;
pub use normalize::{normalize_url, resolve_link, strip_fragment};
