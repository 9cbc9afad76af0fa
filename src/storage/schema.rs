//! Database schema definitions
//!
//! This module contains the SQL schema for the Sumi-Sweep URL ledger.

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- One row per discovered URL; seq preserves discovery order
CREATE TABLE IF NOT EXISTS urls (
    seq INTEGER PRIMARY KEY AUTOINCREMENT,
    hash TEXT NOT NULL UNIQUE,
    url TEXT NOT NULL,
    completed INTEGER NOT NULL DEFAULT 0,
    discovered_at TEXT NOT NULL,
    completed_at TEXT
);

CREATE INDEX IF NOT EXISTS idx_urls_completed ON urls(completed);
"#;

/// Initializes the database schema
///
/// # Arguments
///
/// * `conn` - The database connection
///
/// # Returns
///
/// * `Ok(())` - Schema initialized successfully
/// * `Err(rusqlite::Error)` - Failed to initialize schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}
