//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `CrawlPhase`: lifecycle of one domain crawl (seeding, crawling, draining, done)
//! - `CrawlState`: page count, in-flight reservations and the per-domain page cap
//! - `ConcurrencyGauge`: current and peak number of concurrently running units

mod crawl_phase;
mod crawl_state;

// Re-export main types
pub use crawl_phase::CrawlPhase;
pub use crawl_state::{ConcurrencyGauge, CrawlState, GaugeGuard};
