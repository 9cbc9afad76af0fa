//! Storage module for persisting crawl data
//!
//! This module owns the durable URL ledger:
//! - SQLite database initialization and schema management
//! - Idempotent insertion keyed by the stable URL hash
//! - Completion tracking that survives restarts
//!
//! It also provides the JSON snapshot helpers used for state that lives
//! outside the ledger.

mod schema;
mod snapshot;
mod sqlite;
mod traits;

pub use snapshot::{encode_snapshot, load_snapshot, write_atomic};
pub use sqlite::SqliteLedger;
pub use traits::{Ledger, StorageError, StorageResult};

use std::path::Path;

/// Opens (or creates) the ledger database at `path`
pub fn open_ledger(path: &Path) -> StorageResult<SqliteLedger> {
    SqliteLedger::new(path)
}

/// One URL as stored in the ledger
///
/// `load` returns records in discovery order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlRecord {
    pub hash: String,
    pub url: String,
    pub completed: bool,
}
