//! Word statistics across crawled pages
//!
//! Tracks a global frequency count of meaningful words and the page with
//! the most of them. Shared by all workers behind one mutex and persisted
//! as a JSON snapshot.

use crate::storage::{encode_snapshot, load_snapshot, write_atomic, StorageResult};
use crate::{Result, SweepError};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{LazyLock, Mutex, MutexGuard};

static WORD_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b\w+\b").unwrap());

static STOPWORDS: LazyLock<HashSet<&'static str>> =
    LazyLock::new(|| STOPWORD_LIST.iter().copied().collect());

const STOPWORD_LIST: &[&str] = &[
    "a", "about", "above", "after", "again", "against", "all", "am", "an", "and", "any", "are",
    "aren", "as", "at", "be", "because", "been", "before", "being", "below", "between", "both",
    "but", "by", "can", "cannot", "could", "couldn", "d", "did", "didn", "do", "does", "doesn",
    "doing", "don", "down", "during", "each", "few", "for", "from", "further", "had", "hadn",
    "has", "hasn", "have", "haven", "having", "he", "her", "here", "hers", "herself", "him",
    "himself", "his", "how", "i", "if", "in", "into", "is", "isn", "it", "its", "itself", "just",
    "ll", "let", "m", "me", "more", "most", "mustn", "my", "myself", "no", "nor", "not", "now",
    "of", "off", "on", "once", "only", "or", "other", "ought", "our", "ours", "ourselves", "out",
    "over", "own", "re", "s", "same", "shan", "she", "should", "shouldn", "so", "some", "such",
    "t", "than", "that", "the", "their", "theirs", "them", "themselves", "then", "there",
    "these", "they", "this", "those", "through", "to", "too", "under", "until", "up", "ve",
    "very", "was", "wasn", "we", "were", "weren", "what", "when", "where", "which", "while",
    "who", "whom", "why", "will", "with", "won", "would", "wouldn", "you", "your", "yours",
    "yourself", "yourselves",
];

/// Extracts the lowercase words of `text` that carry meaning
///
/// Stopwords and purely numeric tokens are dropped.
pub fn meaningful_words(text: &str) -> Vec<String> {
    WORD_REGEX
        .find_iter(text)
        .map(|m| m.as_str().to_lowercase())
        .filter(|w| !STOPWORDS.contains(w.as_str()))
        .filter(|w| !w.chars().all(|c| c.is_ascii_digit()))
        .collect()
}

/// The page with the most meaningful words
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LongestPage {
    pub url: String,
    pub words: usize,
}

/// Persisted statistics
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WordStats {
    pub counts: HashMap<String, u64>,
    pub longest: Option<LongestPage>,
}

impl WordStats {
    /// Returns the `n` most frequent words, ties broken alphabetically
    pub fn top_words(&self, n: usize) -> Vec<(String, u64)> {
        let mut words: Vec<(String, u64)> = self
            .counts
            .iter()
            .map(|(word, count)| (word.clone(), *count))
            .collect();
        words.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        words.truncate(n);
        words
    }
}

/// Thread-safe word statistics shared by all workers
pub struct WordTracker {
    stats: Mutex<WordStats>,
    path: Option<PathBuf>,
}

impl WordTracker {
    /// Creates empty statistics that are never persisted
    pub fn new() -> Self {
        Self {
            stats: Mutex::new(WordStats::default()),
            path: None,
        }
    }

    /// Loads the statistics snapshot at `path`, or starts empty
    pub fn load(path: &Path) -> StorageResult<Self> {
        let stats: WordStats = load_snapshot(path)?.unwrap_or_default();
        Ok(Self {
            stats: Mutex::new(stats),
            path: Some(path.to_path_buf()),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, WordStats>> {
        self.stats
            .lock()
            .map_err(|_| SweepError::LockPoisoned("word statistics"))
    }

    /// Adds one page's meaningful words to the totals
    pub fn record(&self, url: &str, words: &[String]) -> Result<()> {
        let mut stats = self.lock()?;

        for word in words {
            *stats.counts.entry(word.clone()).or_insert(0) += 1;
        }

        let longer = stats
            .longest
            .as_ref()
            .map_or(true, |longest| words.len() > longest.words);
        if longer {
            stats.longest = Some(LongestPage {
                url: url.to_string(),
                words: words.len(),
            });
        }
        Ok(())
    }

    /// Returns a copy of the current statistics
    pub fn snapshot(&self) -> Result<WordStats> {
        Ok(self.lock()?.clone())
    }

    /// Writes the statistics snapshot, if the tracker has a backing file
    pub fn save(&self) -> Result<()> {
        let path = match &self.path {
            Some(path) => path,
            None => return Ok(()),
        };

        let bytes = {
            let stats = self.lock()?;
            encode_snapshot(&*stats)?
        };
        write_atomic(path, &bytes)?;
        Ok(())
    }
}

impl Default for WordTracker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_meaningful_words() {
        let words = meaningful_words("The Quick brown fox, the 2024 lazy dog's 3rd bone!");
        assert_eq!(
            words,
            vec!["quick", "brown", "fox", "lazy", "dog", "3rd", "bone"]
        );
    }

    #[test]
    fn test_record_counts_and_longest() {
        let tracker = WordTracker::new();
        tracker
            .record("http://a.edu/1", &meaningful_words("alpha beta alpha"))
            .unwrap();
        tracker
            .record("http://a.edu/2", &meaningful_words("alpha gamma delta epsilon"))
            .unwrap();
        tracker
            .record("http://a.edu/3", &meaningful_words("zeta eta iota kappa"))
            .unwrap();

        let stats = tracker.snapshot().unwrap();
        assert_eq!(stats.counts["alpha"], 3);
        // Ties keep the first page seen
        assert_eq!(
            stats.longest,
            Some(LongestPage {
                url: "http://a.edu/2".to_string(),
                words: 4
            })
        );
    }

    #[test]
    fn test_top_words_ordering() {
        let mut stats = WordStats::default();
        stats.counts.insert("beta".into(), 5);
        stats.counts.insert("alpha".into(), 5);
        stats.counts.insert("gamma".into(), 9);
        stats.counts.insert("delta".into(), 1);

        let top = stats.top_words(3);
        assert_eq!(
            top,
            vec![
                ("gamma".to_string(), 9),
                ("alpha".to_string(), 5),
                ("beta".to_string(), 5)
            ]
        );
    }

    #[test]
    fn test_snapshot_survives_reload() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("words.json");

        let tracker = WordTracker::load(&path).unwrap();
        tracker
            .record("http://a.edu/1", &meaningful_words("research computing"))
            .unwrap();
        tracker.save().unwrap();

        let reloaded = WordTracker::load(&path).unwrap();
        let stats = reloaded.snapshot().unwrap();
        assert_eq!(stats.counts["research"], 1);
        assert_eq!(stats.longest.unwrap().url, "http://a.edu/1");
    }
}
