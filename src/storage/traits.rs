//! Storage traits and error types
//!
//! This module defines the trait interface for persistence sinks and
//! associated error types.

use crate::storage::{Page, RunRecord, RunStatus};
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Run not found: {0}")]
    RunNotFound(i64),

    #[error("Storage lock poisoned")]
    LockPoisoned,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Write rejected: {0}")]
    Rejected(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Persistence sink for crawled pages
///
/// The crawler only ever appends pages; the read methods back the `--stats`
/// report and tests. Implementations must be shareable across workers.
pub trait PageStore: Send + Sync {
    // ===== Pages =====

    /// Appends one crawled page
    fn append_page(&self, page: &Page) -> StorageResult<()>;

    /// Counts all stored pages
    fn count_pages(&self) -> StorageResult<u64>;

    /// Counts stored pages per category, ordered by category name
    fn count_pages_by_category(&self) -> StorageResult<Vec<(String, u64)>>;

    /// Lists the pages stored for one category in insertion order
    fn list_pages(&self, category: &str) -> StorageResult<Vec<Page>>;

    // ===== Runs =====

    /// Records the start of a crawl run
    ///
    /// # Arguments
    ///
    /// * `config_hash` - Hash of the configuration file
    ///
    /// # Returns
    ///
    /// The ID of the newly created run
    fn start_run(&self, config_hash: &str) -> StorageResult<i64>;

    /// Records the end of a crawl run
    fn finish_run(&self, run_id: i64, status: RunStatus, pages_crawled: u64) -> StorageResult<()>;

    /// Gets the most recent run
    fn get_latest_run(&self) -> StorageResult<Option<RunRecord>>;
}
