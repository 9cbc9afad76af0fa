//! SQLite ledger implementation
//!
//! This module provides a SQLite-based implementation of the Ledger trait.

use crate::storage::schema::initialize_schema;
use crate::storage::traits::{Ledger, StorageResult};
use crate::storage::UrlRecord;
use chrono::Utc;
use rusqlite::{params, Connection};
use std::path::Path;
use std::time::Duration;

/// SQLite ledger backend
pub struct SqliteLedger {
    conn: Connection,
}

impl SqliteLedger {
    /// Creates a new SqliteLedger instance
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteLedger)` - Successfully opened/created database
    /// * `Err(StorageError)` - Failed to open database
    pub fn new(path: &Path) -> StorageResult<Self> {
        let conn = Connection::open(path)?;

        // journal_mode reports the resulting mode as a row
        let _mode: String = conn.query_row("PRAGMA journal_mode = WAL", [], |row| row.get(0))?;
        conn.execute_batch(
            "
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
        ",
        )?;
        conn.busy_timeout(Duration::from_secs(5))?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database (for testing)
    #[cfg(test)]
    pub fn new_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }
}

impl Ledger for SqliteLedger {
    fn load(&self) -> StorageResult<Vec<UrlRecord>> {
        let mut stmt = self
            .conn
            .prepare("SELECT hash, url, completed FROM urls ORDER BY seq")?;

        let records = stmt
            .query_map([], |row| {
                Ok(UrlRecord {
                    hash: row.get(0)?,
                    url: row.get(1)?,
                    completed: row.get::<_, i64>(2)? != 0,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(records)
    }

    fn insert(&mut self, hash: &str, url: &str) -> StorageResult<bool> {
        let now = Utc::now().to_rfc3339();
        let changed = self.conn.execute(
            "INSERT OR IGNORE INTO urls (hash, url, discovered_at) VALUES (?1, ?2, ?3)",
            params![hash, url, now],
        )?;
        Ok(changed == 1)
    }

    fn mark_completed(&mut self, hash: &str, url: &str) -> StorageResult<bool> {
        let now = Utc::now().to_rfc3339();
        let changed = self.conn.execute(
            "INSERT INTO urls (hash, url, completed, discovered_at, completed_at)
             VALUES (?1, ?2, 1, ?3, ?3)
             ON CONFLICT(hash) DO UPDATE SET completed = 1, completed_at = excluded.completed_at
             WHERE urls.completed = 0",
            params![hash, url, now],
        )?;
        Ok(changed == 1)
    }

    fn count_records(&self) -> StorageResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM urls", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    fn count_completed(&self) -> StorageResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM urls WHERE completed = 1",
            [],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    fn sync(&mut self) -> StorageResult<()> {
        // Returns (busy, log, checkpointed); in-memory databases report -1s
        self.conn
            .query_row("PRAGMA wal_checkpoint(TRUNCATE)", [], |_| Ok(()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_insert_is_idempotent() {
        let mut ledger = SqliteLedger::new_in_memory().unwrap();

        assert!(ledger.insert("h1", "http://a.edu/").unwrap());
        assert!(!ledger.insert("h1", "http://a.edu/").unwrap());
        assert_eq!(ledger.count_records().unwrap(), 1);
    }

    #[test]
    fn test_load_preserves_discovery_order() {
        let mut ledger = SqliteLedger::new_in_memory().unwrap();
        ledger.insert("h2", "http://a.edu/2").unwrap();
        ledger.insert("h1", "http://a.edu/1").unwrap();
        ledger.insert("h3", "http://a.edu/3").unwrap();

        let urls: Vec<String> = ledger.load().unwrap().into_iter().map(|r| r.url).collect();
        assert_eq!(urls, vec!["http://a.edu/2", "http://a.edu/1", "http://a.edu/3"]);
    }

    #[test]
    fn test_mark_completed_transitions_once() {
        let mut ledger = SqliteLedger::new_in_memory().unwrap();
        ledger.insert("h1", "http://a.edu/").unwrap();

        assert!(ledger.mark_completed("h1", "http://a.edu/").unwrap());
        assert!(!ledger.mark_completed("h1", "http://a.edu/").unwrap());
        assert_eq!(ledger.count_completed().unwrap(), 1);

        let records = ledger.load().unwrap();
        assert!(records[0].completed);
    }

    #[test]
    fn test_mark_completed_unknown_creates_record() {
        let mut ledger = SqliteLedger::new_in_memory().unwrap();

        assert!(ledger.mark_completed("ghost", "http://a.edu/ghost").unwrap());
        assert_eq!(ledger.count_records().unwrap(), 1);
        assert_eq!(ledger.count_completed().unwrap(), 1);

        // A later discovery of the same hash must not reset it
        assert!(!ledger.insert("ghost", "http://a.edu/ghost").unwrap());
        assert!(ledger.load().unwrap()[0].completed);
    }

    #[test]
    fn test_records_survive_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("frontier.db");

        {
            let mut ledger = SqliteLedger::new(&path).unwrap();
            ledger.insert("h1", "http://a.edu/1").unwrap();
            ledger.insert("h2", "http://a.edu/2").unwrap();
            ledger.mark_completed("h1", "http://a.edu/1").unwrap();
            ledger.sync().unwrap();
        }

        let ledger = SqliteLedger::new(&path).unwrap();
        let records = ledger.load().unwrap();
        assert_eq!(records.len(), 2);
        assert!(records[0].completed);
        assert!(!records[1].completed);
    }

    #[test]
    fn test_sync_in_memory_is_harmless() {
        let mut ledger = SqliteLedger::new_in_memory().unwrap();
        assert!(ledger.sync().is_ok());
    }
}
