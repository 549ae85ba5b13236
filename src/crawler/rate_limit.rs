//! Per-domain request pacing
//!
//! One ticker per domain crawl. Every worker takes one tick before it issues
//! its request, so requests to a domain are spaced by at least the politeness
//! delay no matter how many workers are running.

use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::{interval, Interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

/// Shared interval ticker gating request issuance for one domain
#[derive(Debug)]
pub struct RateLimiter {
    ticker: Mutex<Interval>,
}

impl RateLimiter {
    /// Creates a limiter firing every `delay`
    ///
    /// The first tick is available immediately. A zero delay is raised to one
    /// millisecond since the ticker needs a non-zero period.
    pub fn new(delay: Duration) -> Self {
        let period = delay.max(Duration::from_millis(1));
        let mut ticker = interval(period);
        // Missed ticks must not burst; the spacing is a minimum
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        Self {
            ticker: Mutex::new(ticker),
        }
    }

    /// Waits for the next tick
    ///
    /// Returns false if `cancel` fired first; the caller must not issue its
    /// request in that case.
    pub async fn wait(&self, cancel: &CancellationToken) -> bool {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => false,
            _ = async {
                let mut ticker = self.ticker.lock().await;
                ticker.tick().await;
            } => true,
        }
    }
}
