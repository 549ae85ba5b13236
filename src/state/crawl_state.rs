use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Page accounting for one domain crawl
///
/// Guarded by the domain crawl's lock and shared by all of its workers.
/// A worker reserves a slot before it is dispatched and settles the
/// reservation when it finishes, so `crawled` can never pass `cap` even
/// when several workers complete at the same time.
#[derive(Debug, Clone)]
pub struct CrawlState {
    /// Pages fetched and parsed successfully
    crawled: usize,

    /// Dispatched workers that have not settled yet
    in_flight: usize,

    /// Page cap for this domain
    cap: usize,
}

impl CrawlState {
    pub fn new(cap: usize) -> Self {
        Self {
            crawled: 0,
            in_flight: 0,
            cap,
        }
    }

    pub fn crawled(&self) -> usize {
        self.crawled
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    pub fn cap(&self) -> usize {
        self.cap
    }

    /// True once the page cap has been reached
    pub fn cap_reached(&self) -> bool {
        self.crawled >= self.cap
    }

    /// True when another worker could still contribute a page
    pub fn has_headroom(&self) -> bool {
        self.crawled + self.in_flight < self.cap
    }

    /// Reserves a page slot for a worker about to be dispatched
    ///
    /// Returns false when crawled plus in-flight pages already cover the cap.
    pub fn try_reserve(&mut self) -> bool {
        if !self.has_headroom() {
            return false;
        }
        self.in_flight += 1;
        true
    }

    /// Gives back a reservation without counting a page
    pub fn release(&mut self) {
        self.in_flight = self.in_flight.saturating_sub(1);
    }

    /// Settles a reservation, counting the page if it was crawled
    ///
    /// Returns the crawled count after the update.
    pub fn complete(&mut self, page_crawled: bool) -> usize {
        self.release();
        if page_crawled && self.crawled < self.cap {
            self.crawled += 1;
        }
        self.crawled
    }
}

/// Tracks how many units of work run at once and the highest value seen
#[derive(Debug, Default)]
pub struct ConcurrencyGauge {
    current: AtomicUsize,
    peak: AtomicUsize,
}

impl ConcurrencyGauge {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Marks one unit as running until the returned guard is dropped
    pub fn enter(self: &Arc<Self>) -> GaugeGuard {
        let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        GaugeGuard {
            gauge: Arc::clone(self),
        }
    }

    pub fn current(&self) -> usize {
        self.current.load(Ordering::SeqCst)
    }

    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

/// Decrements its gauge on drop
#[derive(Debug)]
pub struct GaugeGuard {
    gauge: Arc<ConcurrencyGauge>,
}

impl Drop for GaugeGuard {
    fn drop(&mut self) {
        self.gauge.current.fetch_sub(1, Ordering::SeqCst);
    }
}
