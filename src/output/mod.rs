//! Output module for crawl summaries and reports
//!
//! This module handles:
//! - Printing the end-of-run summary
//! - Reading and displaying statistics from the database

pub mod stats;

pub use stats::{load_statistics, print_statistics, CrawlStatistics};

use crate::crawler::RunSummary;

/// Prints the end-of-run summary to stdout
///
/// Reports are grouped by category, then by domain.
pub fn print_run_summary(summary: &RunSummary) {
    println!("=== Crawl Summary ===\n");

    println!("Domains:");
    println!("  Completed: {}", summary.domains_completed);
    println!("  Failed: {}", summary.domains_failed);
    if summary.domains_cancelled > 0 {
        println!("  Cancelled: {}", summary.domains_cancelled);
    }
    if summary.domains_skipped > 0 {
        println!("  Not started: {}", summary.domains_skipped);
    }
    println!("  Peak concurrent crawls: {}", summary.peak_domain_crawls);
    println!();

    println!("Pages crawled: {}", summary.pages_crawled);

    if summary.reports.is_empty() {
        return;
    }

    let mut reports: Vec<_> = summary.reports.iter().collect();
    reports.sort_by(|a, b| (&a.category, &a.domain).cmp(&(&b.category, &b.domain)));

    println!();
    println!("By Domain:");
    for report in reports {
        let robots = if report.robots_active {
            ""
        } else {
            " [no robots.txt]"
        };
        println!(
            "  [{}] {} ({}): {} pages, peak {} workers{}",
            report.category,
            report.domain,
            report.seed.scheme(),
            report.pages_crawled,
            report.peak_workers,
            robots
        );
    }
}
