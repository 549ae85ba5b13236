//! Configuration module for the category crawler
//!
//! This module handles loading, parsing, and validating TOML configuration files,
//! including the optional JSON categories file they may point to.
//!
//! # Example
//!
//! ```no_run
//! use category_crawler::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("crawler.toml")).unwrap();
//! println!("Page cap per domain: {}", config.crawler.max_pages_per_domain);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{Config, CrawlerConfig, OutputConfig, UserAgentConfig};

// Re-export parser functions
pub use parser::{compute_config_hash, load_categories_file, load_config, load_config_with_hash};
