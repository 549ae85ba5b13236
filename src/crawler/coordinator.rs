//! Domain crawl coordinator - per-domain crawl orchestration
//!
//! This module contains the crawl loop for one domain, including:
//! - Seeding by probing https then http
//! - Resolving robots.txt rules (fail-open)
//! - Pulling URLs from the frontier and dispatching fetch workers
//! - Enforcing the page cap and the per-domain worker limit
//! - Draining in-flight workers before returning

use crate::crawler::fetcher::{fetch_page, probe_reachable, RetryPolicy};
use crate::crawler::frontier::Frontier;
use crate::crawler::parser::extract_page;
use crate::crawler::rate_limit::RateLimiter;
use crate::crawler::scheduler::Job;
use crate::robots::{fetch_robots_group, RobotsGroup};
use crate::state::{ConcurrencyGauge, CrawlPhase, CrawlState};
use crate::storage::Page;
use crate::url::CrawlScope;
use crate::{CrawlContext, CrawlError};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio::task::{JoinError, JoinSet};
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use url::Url;

/// Outcome of a finished domain crawl
#[derive(Debug, Clone)]
pub struct DomainReport {
    pub category: String,
    pub domain: String,

    /// The URL seeding selected
    pub seed: Url,

    /// Pages counted toward the cap
    pub pages_crawled: usize,

    /// Highest number of fetch workers seen running at once
    pub peak_workers: usize,

    /// False when robots.txt was unavailable and every path was allowed
    pub robots_active: bool,
}

/// Why the coordinating loop stopped dispatching
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StopReason {
    Cancelled,
    CapReached,
    Exhausted,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Cancelled => "cancelled",
            Self::CapReached => "page cap reached",
            Self::Exhausted => "frontier exhausted",
        })
    }
}

/// State shared between the coordinating loop and its workers
struct CrawlShared {
    ctx: Arc<CrawlContext>,
    category: String,
    frontier: Arc<Frontier>,
    state: Mutex<CrawlState>,
    limiter: RateLimiter,
    retry: RetryPolicy,
    gauge: Arc<ConcurrencyGauge>,
    cancel: CancellationToken,
}

impl CrawlShared {
    fn state(&self) -> MutexGuard<'_, CrawlState> {
        match self.state.lock() {
            Ok(state) => state,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Fetches, extracts and persists one page, then feeds its links back
    ///
    /// Links are enqueued before the caller settles the reservation so that
    /// zero in-flight workers implies every discovered link is queued.
    async fn process(&self, url: &Url) -> Result<(), CrawlError> {
        let fetched = fetch_page(&self.ctx.client, url, &self.retry).await?;
        let final_url = fetched.final_url.clone();
        let body = fetched.into_body().await?;

        let extracted = extract_page(&body, &final_url, self.frontier.scope());

        let page = Page {
            url: final_url.to_string(),
            title: extracted.title,
            snippet: extracted.snippet,
            category: self.category.clone(),
        };

        let persisted = self
            .ctx
            .store
            .append_page(&page)
            .map_err(|source| CrawlError::PersistFailed {
                url: page.url.clone(),
                source,
            });

        for link in extracted.links {
            self.frontier.enqueue(link);
        }

        persisted
    }
}

/// Crawls one domain for one category
pub struct DomainCrawl {
    ctx: Arc<CrawlContext>,
    job: Job,
    cancel: CancellationToken,
    phase: CrawlPhase,
}

impl DomainCrawl {
    /// Creates a domain crawl
    ///
    /// `cancel` should be a child of the run's root token so that cancelling
    /// this crawl never affects its siblings.
    pub fn new(ctx: Arc<CrawlContext>, job: Job, cancel: CancellationToken) -> Self {
        Self {
            ctx,
            job,
            cancel,
            phase: CrawlPhase::Seeding,
        }
    }

    pub fn phase(&self) -> CrawlPhase {
        self.phase
    }

    /// Runs the crawl to completion
    ///
    /// # Returns
    ///
    /// * `Ok(DomainReport)` - The crawl reached `Done`
    /// * `Err(CrawlError::SeedUnreachable)` - Neither scheme answered the probe
    /// * `Err(CrawlError::Cancelled)` - Cancelled before a seed was found
    pub async fn run(mut self) -> Result<DomainReport, CrawlError> {
        let scope = CrawlScope::parse(&self.job.domain)?;
        tracing::info!(
            "Starting crawl of {} (category '{}')",
            scope.authority(),
            self.job.category
        );

        let seed = match self.find_seed(&scope).await {
            Ok(seed) => seed,
            Err(e) => {
                self.advance(CrawlPhase::Failed);
                return Err(e);
            }
        };
        tracing::info!("Seed for {} is {}", scope.authority(), seed);

        let robots = self.resolve_robots(&scope).await;
        let robots_active = robots.is_some();

        let settings = &self.ctx.settings;
        let (frontier, mut rx) = Frontier::new(scope.clone(), settings.queue_capacity);
        let shared = Arc::new(CrawlShared {
            ctx: Arc::clone(&self.ctx),
            category: self.job.category.clone(),
            frontier: Arc::clone(&frontier),
            state: Mutex::new(CrawlState::new(settings.max_pages_per_domain)),
            limiter: RateLimiter::new(settings.politeness_delay()),
            retry: RetryPolicy::new(settings.max_retries, settings.retry_base_delay()),
            gauge: ConcurrencyGauge::new(),
            cancel: self.cancel.clone(),
        });
        let permits = Arc::new(Semaphore::new(settings.max_workers_per_domain));
        let idle = settings.idle_timeout();

        frontier.enqueue(seed.clone());
        self.advance(CrawlPhase::Crawling);

        let mut workers = JoinSet::new();
        let mut stop_signal = false;

        let reason = loop {
            if self.cancel.is_cancelled() {
                break StopReason::Cancelled;
            }
            if shared.state().cap_reached() {
                break StopReason::CapReached;
            }

            if !shared.state().has_headroom() {
                if workers.is_empty() {
                    // No worker left to settle the outstanding slots
                    tracing::warn!(
                        "{} page slots held with no running workers",
                        shared.state().in_flight()
                    );
                    break StopReason::CapReached;
                }

                // Every remaining slot is held by an in-flight worker
                tokio::select! {
                    biased;
                    _ = self.cancel.cancelled() => {}
                    Some(result) = workers.join_next() => log_join_result(result),
                }
                continue;
            }

            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => {}
                Some(result) = workers.join_next(), if !workers.is_empty() => {
                    log_join_result(result);
                }
                next = timeout(idle, rx.recv()) => match next {
                    Ok(Some(url)) => {
                        stop_signal = false;
                        self.dispatch(url, robots.as_ref(), &shared, &permits, &mut workers)
                            .await;
                    }
                    Ok(None) => break StopReason::Exhausted,
                    Err(_) => {
                        if shared.state().in_flight() == 0 {
                            if stop_signal {
                                break StopReason::Exhausted;
                            }
                            tracing::debug!("Frontier for {} is idle", scope.authority());
                            stop_signal = true;
                        }
                    }
                },
            }
        };

        tracing::info!("Stopping crawl of {}: {}", scope.authority(), reason);
        self.advance(CrawlPhase::Draining);

        rx.close();
        while let Some(result) = workers.join_next().await {
            log_join_result(result);
        }

        self.advance(CrawlPhase::Done);

        let pages_crawled = shared.state().crawled();
        tracing::info!(
            "Finished {}: {} pages, {} URLs discovered",
            scope.authority(),
            pages_crawled,
            frontier.visited_count()
        );

        Ok(DomainReport {
            category: self.job.category.clone(),
            domain: scope.authority(),
            seed,
            pages_crawled,
            peak_workers: shared.gauge.peak(),
            robots_active,
        })
    }

    /// Probes `https://domain/` then `http://domain/`
    async fn find_seed(&self, scope: &CrawlScope) -> Result<Url, CrawlError> {
        for scheme in ["https", "http"] {
            let candidate = scope.url_for(scheme, "/")?;
            let reachable = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return Err(CrawlError::Cancelled),
                reachable = probe_reachable(&self.ctx.client, &candidate) => reachable,
            };
            if reachable {
                return Ok(candidate);
            }
        }

        Err(CrawlError::SeedUnreachable {
            domain: scope.authority(),
        })
    }

    /// Fetches robots.txt, returning None (allow all) when it is unavailable
    async fn resolve_robots(&self, scope: &CrawlScope) -> Option<RobotsGroup> {
        let fetched = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => return None,
            fetched = fetch_robots_group(&self.ctx.client, scope, &self.ctx.robots_agent) => fetched,
        };

        match fetched {
            Ok(group) => {
                tracing::debug!(
                    "robots.txt rules for {} resolved for agent {}",
                    scope.authority(),
                    group.agent()
                );
                Some(group)
            }
            Err(e) => {
                tracing::warn!("{}; crawling {} with all paths allowed", e, scope.authority());
                None
            }
        }
    }

    /// Gates one URL through robots, the page cap and the worker pool
    async fn dispatch(
        &self,
        url: Url,
        robots: Option<&RobotsGroup>,
        shared: &Arc<CrawlShared>,
        permits: &Arc<Semaphore>,
        workers: &mut JoinSet<()>,
    ) {
        if let Some(group) = robots {
            if !group.is_allowed(url.as_str()) {
                tracing::debug!("URL {} disallowed by robots.txt", url);
                return;
            }
        }

        let Some(slot) = PageSlot::reserve(shared) else {
            tracing::debug!("Page cap covered, skipping {}", url);
            return;
        };

        let permit = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => None,
            permit = Arc::clone(permits).acquire_owned() => permit.ok(),
        };

        // Dropping an unused slot gives it back
        let Some(permit) = permit else {
            return;
        };

        workers.spawn(crawl_page(slot, url, permit));
    }

    fn advance(&mut self, next: CrawlPhase) {
        debug_assert!(
            self.phase.can_transition_to(next),
            "illegal transition {} -> {}",
            self.phase,
            next
        );
        tracing::debug!("{}: {} -> {}", self.job.domain, self.phase, next);
        self.phase = next;
    }
}

/// A reserved page slot
///
/// Settled explicitly with [`PageSlot::complete`]. A slot dropped unsettled,
/// whether on an early return, an aborted task or a panicking worker, is
/// released without counting a page.
struct PageSlot {
    shared: Arc<CrawlShared>,
    settled: bool,
}

impl PageSlot {
    fn reserve(shared: &Arc<CrawlShared>) -> Option<Self> {
        if !shared.state().try_reserve() {
            return None;
        }
        Some(Self {
            shared: Arc::clone(shared),
            settled: false,
        })
    }

    fn complete(mut self, counted: bool) -> usize {
        self.settled = true;
        self.shared.state().complete(counted)
    }
}

impl Drop for PageSlot {
    fn drop(&mut self) {
        if !self.settled {
            self.shared.state().release();
        }
    }
}

/// One fetch worker; holds its permit and page slot until it returns
async fn crawl_page(slot: PageSlot, url: Url, _permit: OwnedSemaphorePermit) {
    let shared = Arc::clone(&slot.shared);
    let _active = shared.gauge.enter();

    if !shared.limiter.wait(&shared.cancel).await {
        return;
    }

    let outcome = tokio::select! {
        biased;
        _ = shared.cancel.cancelled() => None,
        result = shared.process(&url) => Some(result),
    };

    let counted = match outcome {
        None => {
            tracing::debug!("Abandoning {} after cancellation", url);
            return;
        }
        Some(Ok(())) => {
            tracing::debug!("Crawled {}", url);
            true
        }
        Some(Err(e @ CrawlError::PersistFailed { .. })) => {
            // Still counted toward the cap
            tracing::error!("{}", e);
            true
        }
        Some(Err(e @ CrawlError::FetchRejected { .. })) => {
            tracing::info!("{}", e);
            false
        }
        Some(Err(e)) => {
            tracing::warn!("{}", e);
            false
        }
    };

    slot.complete(counted);
}

fn log_join_result(result: Result<(), JoinError>) {
    if let Err(e) = result {
        if e.is_panic() {
            tracing::error!("Fetch worker panicked: {}", e);
        }
    }
}
