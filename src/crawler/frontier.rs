//! Frontier queue and visited set for one domain crawl
//!
//! The queue is a bounded channel. Enqueueing never waits: when the channel
//! is full the URL is dropped and a warning is logged, trading breadth for
//! bounded memory when discovery outpaces fetching.

use crate::url::{strip_fragment, CrawlScope};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc::{self, error::TrySendError, Receiver, Sender};
use url::Url;

/// What happened to a URL handed to [`Frontier::enqueue`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnqueueOutcome {
    /// Marked visited and pushed onto the queue
    Enqueued,

    /// Already in the visited set
    AlreadySeen,

    /// Host (or port) outside the crawl scope
    OutOfScope,

    /// Marked visited but the queue was full (or closed)
    Dropped,
}

/// Producer side of a domain's frontier, shared by all of its workers
#[derive(Debug)]
pub struct Frontier {
    scope: CrawlScope,
    visited: Mutex<HashSet<String>>,
    tx: Sender<Url>,
}

impl Frontier {
    /// Creates a frontier holding at most `capacity` pending URLs
    ///
    /// The receiver goes to the coordinating loop, the only consumer.
    pub fn new(scope: CrawlScope, capacity: usize) -> (Arc<Self>, Receiver<Url>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let frontier = Arc::new(Self {
            scope,
            visited: Mutex::new(HashSet::new()),
            tx,
        });
        (frontier, rx)
    }

    pub fn scope(&self) -> &CrawlScope {
        &self.scope
    }

    /// Offers a URL to the crawl
    ///
    /// The fragment is stripped before the visited-set test-and-set, so
    /// `/a#x` and `/a#y` count as one URL. A URL is pushed at most once for
    /// the lifetime of the frontier.
    pub fn enqueue(&self, url: Url) -> EnqueueOutcome {
        let url = strip_fragment(url);

        if !self.scope.contains(&url) {
            tracing::debug!("Not enqueueing out-of-scope URL {}", url);
            return EnqueueOutcome::OutOfScope;
        }

        if !self.mark_visited(url.as_str()) {
            return EnqueueOutcome::AlreadySeen;
        }

        match self.tx.try_send(url) {
            Ok(()) => EnqueueOutcome::Enqueued,
            Err(TrySendError::Full(url)) => {
                tracing::warn!("Frontier full for {}, dropping {}", self.scope.authority(), url);
                EnqueueOutcome::Dropped
            }
            Err(TrySendError::Closed(url)) => {
                tracing::debug!("Frontier closed for {}, dropping {}", self.scope.authority(), url);
                EnqueueOutcome::Dropped
            }
        }
    }

    /// Number of distinct URLs ever accepted into the visited set
    pub fn visited_count(&self) -> usize {
        match self.visited.lock() {
            Ok(visited) => visited.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        }
    }

    /// Atomic test-and-set; true if the URL was not seen before
    fn mark_visited(&self, key: &str) -> bool {
        let mut visited = match self.visited.lock() {
            Ok(visited) => visited,
            Err(poisoned) => poisoned.into_inner(),
        };
        visited.insert(key.to_string())
    }
}
