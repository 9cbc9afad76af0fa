//! Plain-text crawl report
//!
//! The report is rewritten in full by the sampler on every tick and once
//! more at shutdown, so it always reflects the latest persisted state.

use crate::frontier::Frontier;
use crate::output::words::{LongestPage, WordTracker};
use crate::storage::write_atomic;
use crate::Result;
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::path::Path;

/// Number of words listed in the report
pub const TOP_WORDS: usize = 50;

/// Everything the report file shows
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrawlReport {
    /// Distinct URLs in the ledger
    pub unique_urls: usize,

    /// Assigned hosts and how many URLs each contributed
    pub subdomains: BTreeMap<String, usize>,

    pub longest: Option<LongestPage>,

    /// Most frequent meaningful words, most frequent first
    pub top_words: Vec<(String, u64)>,
}

impl CrawlReport {
    /// Gathers a report from live crawl state
    ///
    /// Each source is locked separately; the report may therefore mix
    /// values from slightly different moments.
    pub fn collect(frontier: &Frontier, words: &WordTracker) -> Result<Self> {
        let unique_urls = frontier.unique_urls()?;
        let subdomains = frontier.subdomain_counts()?;
        let stats = words.snapshot()?;

        Ok(Self {
            unique_urls,
            subdomains,
            top_words: stats.top_words(TOP_WORDS),
            longest: stats.longest,
        })
    }

    /// Renders the report as text
    pub fn format(&self) -> String {
        let mut out = String::new();

        let _ = writeln!(out, "UNIQUE URLS: {}", self.unique_urls);
        out.push('\n');

        let _ = writeln!(out, "SUBDOMAINS ({}):", self.subdomains.len());
        for (host, count) in &self.subdomains {
            let _ = writeln!(out, "{}, {}", host, count);
        }
        out.push('\n');

        out.push_str("LONGEST PAGE:\n");
        match &self.longest {
            Some(page) => {
                let _ = writeln!(out, "{} ({} words)", page.url, page.words);
            }
            None => out.push_str("none\n"),
        }
        out.push('\n');

        let _ = writeln!(out, "TOP {} WORDS:", TOP_WORDS);
        for (rank, (word, count)) in self.top_words.iter().enumerate() {
            let _ = writeln!(out, "{:>2}. {} - {}", rank + 1, word, count);
        }

        out
    }

    /// Writes the report to `path`, replacing any previous version
    pub fn write_to(&self, path: &Path) -> Result<()> {
        write_atomic(path, self.format().as_bytes())?;
        Ok(())
    }
}

/// Collects a report from live state and writes it to `path`
pub fn write_report(frontier: &Frontier, words: &WordTracker, path: &Path) -> Result<()> {
    CrawlReport::collect(frontier, words)?.write_to(path)
}
