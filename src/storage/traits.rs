//! Storage traits and error types
//!
//! This module defines the trait interface for the URL ledger and the
//! associated error types.

use crate::storage::UrlRecord;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Durable record of every URL the crawl has discovered
///
/// Records are keyed by the stable URL hash. The ledger is append and
/// update only: a record is never deleted and its completion flag never
/// reverts to false.
pub trait Ledger: Send {
    /// Loads every record in discovery order
    fn load(&self) -> StorageResult<Vec<UrlRecord>>;

    /// Inserts an incomplete record
    ///
    /// # Returns
    ///
    /// `true` if the hash was not present before, `false` if the call was ignored
    fn insert(&mut self, hash: &str, url: &str) -> StorageResult<bool>;

    /// Marks a record completed, creating it if it was never inserted
    ///
    /// # Returns
    ///
    /// `true` if this call changed the record from incomplete (or absent) to completed
    fn mark_completed(&mut self, hash: &str, url: &str) -> StorageResult<bool>;

    /// Counts all records
    fn count_records(&self) -> StorageResult<u64>;

    /// Counts completed records
    fn count_completed(&self) -> StorageResult<u64>;

    /// Flushes pending writes to the main database file
    fn sync(&mut self) -> StorageResult<()>;
}
