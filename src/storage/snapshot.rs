//! JSON snapshot files
//!
//! In-memory state that is not part of the ledger (duplicate detector,
//! word statistics) is persisted as whole-file JSON snapshots. Writes go to
//! a temporary sibling first and are renamed into place, so a crash leaves
//! either the previous snapshot or the new one.

use crate::storage::traits::StorageResult;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs::{self, File};
use std::io::{BufReader, Write};
use std::path::{Path, PathBuf};

/// Serializes a value to bytes suitable for `write_atomic`
///
/// Split from the write so callers can serialize while holding a lock and
/// perform file I/O after releasing it.
pub fn encode_snapshot<T: Serialize>(value: &T) -> StorageResult<Vec<u8>> {
    Ok(serde_json::to_vec(value)?)
}

/// Replaces the file at `path` with `bytes`
pub fn write_atomic(path: &Path, bytes: &[u8]) -> StorageResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let temp_path = temp_path_for(path);
    {
        let mut file = File::create(&temp_path)?;
        file.write_all(bytes)?;
        file.sync_all()?;
    }
    fs::rename(&temp_path, path)?;
    Ok(())
}

/// Loads a snapshot, returning `None` if the file does not exist
pub fn load_snapshot<T: DeserializeOwned>(path: &Path) -> StorageResult<Option<T>> {
    if !path.exists() {
        return Ok(None);
    }

    let reader = BufReader::new(File::open(path)?);
    Ok(Some(serde_json::from_reader(reader)?))
}

fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".tmp");
    PathBuf::from(name)
}
