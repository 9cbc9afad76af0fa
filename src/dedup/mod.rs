//! Exact and near-duplicate page detection
//!
//! Pages are classified by their visible text. An exact duplicate has the
//! same SHA-256 digest (after whitespace normalization) as a page seen
//! before. A near duplicate shares at least `threshold` of its 5-word
//! shingles (Jaccard similarity) with a page already accepted.
//!
//! Near-duplicate search compares against every accepted page, so its cost
//! grows linearly with the crawl. MinHash with banding is the known fix if
//! that ever dominates.

mod shingle;

pub use shingle::{jaccard, normalize_whitespace, shingles, SHINGLE_SIZE};

use crate::storage::{encode_snapshot, load_snapshot, write_atomic, StorageResult};
use crate::{Result, SweepError};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

/// Verdict on one page's text
#[derive(Debug, Clone, PartialEq)]
pub enum Classification {
    /// Not seen before; the page's shingles are now indexed
    Unique,
    /// Same text as an earlier page
    ExactDuplicate,
    /// Shingle overlap with `of` reached the threshold
    NearDuplicate { of: String, similarity: f64 },
}

/// Persisted detector state
#[derive(Debug, Default, Serialize, Deserialize)]
struct DedupState {
    exact_hashes: HashSet<String>,
    shingles: HashMap<String, HashSet<String>>,
}

/// Counts describing the detector's indexes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DedupStats {
    pub exact_hashes: usize,
    pub indexed_pages: usize,
}

/// Thread-safe duplicate detector shared by all workers
pub struct DuplicateDetector {
    state: Mutex<DedupState>,
    threshold: f64,
    path: Option<PathBuf>,
}

impl DuplicateDetector {
    /// Creates an empty detector that is never persisted
    pub fn new(threshold: f64) -> Self {
        Self {
            state: Mutex::new(DedupState::default()),
            threshold,
            path: None,
        }
    }

    /// Loads the detector snapshot at `path`, or starts empty if there is none
    pub fn load(path: &Path, threshold: f64) -> StorageResult<Self> {
        let state: DedupState = load_snapshot(path)?.unwrap_or_default();
        tracing::info!(
            "Duplicate detector loaded: {} content hashes, {} indexed pages",
            state.exact_hashes.len(),
            state.shingles.len()
        );

        Ok(Self {
            state: Mutex::new(state),
            threshold,
            path: Some(path.to_path_buf()),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, DedupState>> {
        self.state
            .lock()
            .map_err(|_| SweepError::LockPoisoned("duplicate detector"))
    }

    /// Classifies a page and records it if it is original
    ///
    /// # Arguments
    ///
    /// * `url` - The page URL, remembered as the original for later near duplicates
    /// * `text` - The page's visible text
    pub fn classify(&self, url: &str, text: &str) -> Result<Classification> {
        let normalized = normalize_whitespace(text);
        let digest = hex::encode(Sha256::digest(normalized.as_bytes()));
        let page_shingles = shingles(&normalized);

        let mut state = self.lock()?;

        if !state.exact_hashes.insert(digest) {
            return Ok(Classification::ExactDuplicate);
        }

        let closest = state
            .shingles
            .iter()
            .map(|(other, set)| (other, jaccard(&page_shingles, set)))
            .filter(|(_, similarity)| *similarity >= self.threshold)
            .max_by(|a, b| a.1.total_cmp(&b.1));

        if let Some((of, similarity)) = closest {
            return Ok(Classification::NearDuplicate {
                of: of.clone(),
                similarity,
            });
        }

        state.shingles.insert(url.to_string(), page_shingles);
        Ok(Classification::Unique)
    }

    pub fn stats(&self) -> Result<DedupStats> {
        let state = self.lock()?;
        Ok(DedupStats {
            exact_hashes: state.exact_hashes.len(),
            indexed_pages: state.shingles.len(),
        })
    }

    /// Writes the detector snapshot, if the detector has a backing file
    pub fn save(&self) -> Result<()> {
        let path = match &self.path {
            Some(path) => path,
            None => return Ok(()),
        };

        let bytes = {
            let state = self.lock()?;
            encode_snapshot(&*state)?
        };
        write_atomic(path, &bytes)?;
        Ok(())
    }
}
