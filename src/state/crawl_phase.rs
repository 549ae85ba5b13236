use std::fmt;

/// Lifecycle of a domain crawl
///
/// `Seeding → Crawling → Draining → Done`, with `Failed` reachable only from
/// `Seeding` when no seed URL responds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CrawlPhase {
    /// Probing schemes for a reachable seed URL
    Seeding,

    /// Coordinating loop is dispatching workers
    Crawling,

    /// No new work is dispatched; waiting for in-flight workers
    Draining,

    /// All workers finished
    Done,

    /// No seed was reachable; no worker was ever started
    Failed,
}

impl CrawlPhase {
    /// Returns true if this is a terminal phase
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }

    /// Checks whether moving to `next` is a legal transition
    pub fn can_transition_to(&self, next: CrawlPhase) -> bool {
        matches!(
            (self, next),
            (Self::Seeding, Self::Crawling)
                | (Self::Seeding, Self::Failed)
                | (Self::Crawling, Self::Draining)
                | (Self::Draining, Self::Done)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Seeding => "seeding",
            Self::Crawling => "crawling",
            Self::Draining => "draining",
            Self::Done => "done",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for CrawlPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
