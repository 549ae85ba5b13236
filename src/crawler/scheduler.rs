//! Job scheduler for running domain crawls
//!
//! This module handles:
//! - Expanding the category configuration into crawl jobs
//! - Bounding concurrent domain crawls with a global semaphore
//! - Stopping job issuance on shutdown while in-flight crawls drain
//! - Isolating per-domain failures from the rest of the run

use crate::crawler::coordinator::{DomainCrawl, DomainReport};
use crate::state::ConcurrencyGauge;
use crate::{CrawlContext, CrawlError};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

/// One domain to crawl for one category
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    pub category: String,
    pub domain: String,
}

/// Expands category → domains into a flat job list
///
/// Categories come out in name order and domains in configured order.
/// Domains are trimmed; blank entries are skipped.
///
/// # Example
///
/// ```
/// use category_crawler::crawler::expand_jobs;
/// use std::collections::BTreeMap;
///
/// let mut categories = BTreeMap::new();
/// categories.insert("news".to_string(), vec!["a.com".to_string(), " ".to_string()]);
/// let jobs = expand_jobs(&categories);
/// assert_eq!(jobs.len(), 1);
/// assert_eq!(jobs[0].domain, "a.com");
/// ```
pub fn expand_jobs(categories: &BTreeMap<String, Vec<String>>) -> Vec<Job> {
    categories
        .iter()
        .flat_map(|(category, domains)| {
            domains
                .iter()
                .map(|domain| domain.trim())
                .filter(|domain| !domain.is_empty())
                .map(move |domain| Job {
                    category: category.clone(),
                    domain: domain.to_string(),
                })
        })
        .collect()
}

/// Totals for a whole run
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    /// Domain crawls that reached `Done`
    pub domains_completed: usize,

    /// Domain crawls that returned an error
    pub domains_failed: usize,

    /// Domain crawls cancelled before a seed was found
    pub domains_cancelled: usize,

    /// Jobs never started because shutdown was requested
    pub domains_skipped: usize,

    /// Pages counted across all completed domains
    pub pages_crawled: usize,

    /// Highest number of domain crawls seen running at once
    pub peak_domain_crawls: usize,

    /// Per-domain reports, in completion order
    pub reports: Vec<DomainReport>,
}

/// Runs crawl jobs under a global concurrency limit
pub struct JobScheduler {
    ctx: Arc<CrawlContext>,

    /// Global semaphore for limiting concurrent domain crawls
    global_semaphore: Arc<Semaphore>,

    gauge: Arc<ConcurrencyGauge>,
}

impl JobScheduler {
    pub fn new(ctx: Arc<CrawlContext>) -> Self {
        let global_semaphore = Arc::new(Semaphore::new(ctx.settings.max_global_workers));

        Self {
            ctx,
            global_semaphore,
            gauge: ConcurrencyGauge::new(),
        }
    }

    /// Runs every job and waits for all started crawls to finish
    ///
    /// Each crawl gets a child of `shutdown`, so cancelling `shutdown` stops
    /// them all while a crawl ending early never touches its siblings. Once
    /// `shutdown` fires no further jobs are started.
    pub async fn run(&self, jobs: Vec<Job>, shutdown: &CancellationToken) -> RunSummary {
        let mut summary = RunSummary::default();
        let mut crawls = JoinSet::new();
        let total = jobs.len();

        tracing::info!(
            "Scheduling {} domain crawls ({} at a time)",
            total,
            self.ctx.settings.max_global_workers
        );

        for (index, job) in jobs.into_iter().enumerate() {
            let permit = tokio::select! {
                biased;
                _ = shutdown.cancelled() => None,
                permit = Arc::clone(&self.global_semaphore).acquire_owned() => permit.ok(),
            };

            let Some(permit) = permit else {
                summary.domains_skipped = total - index;
                tracing::warn!(
                    "Shutdown requested, not starting {} remaining jobs",
                    summary.domains_skipped
                );
                break;
            };

            let crawl = DomainCrawl::new(Arc::clone(&self.ctx), job.clone(), shutdown.child_token());
            let gauge = Arc::clone(&self.gauge);

            crawls.spawn(async move {
                let _permit = permit;
                let _active = gauge.enter();
                (job, crawl.run().await)
            });
        }

        while let Some(joined) = crawls.join_next().await {
            match joined {
                Ok((_, Ok(report))) => {
                    summary.domains_completed += 1;
                    summary.pages_crawled += report.pages_crawled;
                    summary.reports.push(report);
                }
                Ok((job, Err(CrawlError::Cancelled))) => {
                    tracing::info!("Crawl of {} cancelled before seeding", job.domain);
                    summary.domains_cancelled += 1;
                }
                Ok((job, Err(e))) => {
                    tracing::error!(
                        "Crawl of {} (category '{}') failed: {}",
                        job.domain,
                        job.category,
                        e
                    );
                    summary.domains_failed += 1;
                }
                Err(e) => {
                    tracing::error!("Domain crawl task failed: {}", e);
                    summary.domains_failed += 1;
                }
            }
        }

        summary.peak_domain_crawls = self.gauge.peak();
        summary
    }
}
