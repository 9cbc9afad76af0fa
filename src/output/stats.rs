//! Statistics generation from the crawl ledger
//!
//! This module provides functionality for extracting and displaying
//! crawl statistics from persisted state, without starting a crawl.

use crate::dedup::DedupStats;
use crate::storage::Ledger;
use crate::url::Scope;
use crate::Result;
use std::collections::BTreeMap;
use url::Url;

/// Crawl statistics summary
#[derive(Debug, Clone, Default)]
pub struct CrawlStatistics {
    /// Total number of URLs discovered
    pub total_urls: u64,

    /// URLs retired (crawled, skipped or failed)
    pub completed: u64,

    /// Assigned hosts and how many URLs each contributed
    pub subdomains: BTreeMap<String, usize>,

    /// Duplicate detector store sizes, if a snapshot exists
    pub dedup: Option<DedupStats>,
}

impl CrawlStatistics {
    /// URLs discovered but not yet retired
    pub fn pending(&self) -> u64 {
        self.total_urls.saturating_sub(self.completed)
    }
}

/// Loads statistics from the ledger
///
/// # Arguments
///
/// * `ledger` - The ledger to query
/// * `scope` - Decides which hosts count as assigned subdomains
///
/// # Returns
///
/// * `Ok(CrawlStatistics)` - Successfully loaded statistics
/// * `Err(SweepError)` - Failed to query the ledger
pub fn load_statistics(ledger: &dyn Ledger, scope: &Scope) -> Result<CrawlStatistics> {
    let total_urls = ledger.count_records()?;
    let completed = ledger.count_completed()?;

    let mut subdomains = BTreeMap::new();
    for record in ledger.load()? {
        let host = Url::parse(&record.url)
            .ok()
            .and_then(|url| url.host_str().map(|h| h.to_string()));
        if let Some(host) = host {
            if scope.is_assigned_host(&host) {
                *subdomains.entry(host).or_insert(0) += 1;
            }
        }
    }

    Ok(CrawlStatistics {
        total_urls,
        completed,
        subdomains,
        dedup: None,
    })
}

/// Prints statistics to stdout in a formatted manner
///
/// # Arguments
///
/// * `stats` - The statistics to display
pub fn print_statistics(stats: &CrawlStatistics) {
    println!("=== Crawl Statistics ===\n");

    println!("Overview:");
    println!("  Total URLs discovered: {}", stats.total_urls);
    println!("  Completed: {}", stats.completed);
    println!("  Pending: {}", stats.pending());
    println!();

    if let Some(dedup) = &stats.dedup {
        println!("Duplicate Detection:");
        println!("  Content hashes: {}", dedup.exact_hashes);
        println!("  Indexed pages: {}", dedup.indexed_pages);
        println!();
    }

    println!("Subdomains ({}):", stats.subdomains.len());
    for (host, count) in &stats.subdomains {
        println!("  {}, {}", host, count);
    }
    println!();

    let progress = if stats.total_urls > 0 {
        (stats.completed as f64 / stats.total_urls as f64) * 100.0
    } else {
        0.0
    };

    println!(
        "Progress: {:.1}% ({} / {} URLs retired)",
        progress, stats.completed, stats.total_urls
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ScopeConfig;
    use crate::storage::SqliteLedger;

    fn test_scope() -> Scope {
        Scope::from_config(&ScopeConfig {
            domains: vec!["*.ics.uci.edu".to_string()],
            path_restricted: vec![],
            max_url_length: 300,
            max_query_params: 5,
            max_path_depth: 10,
        })
        .unwrap()
    }

    #[test]
    fn test_load_statistics() {
        let mut ledger = SqliteLedger::new_in_memory().unwrap();
        ledger.insert("h1", "https://www.ics.uci.edu/a").unwrap();
        ledger.insert("h2", "https://www.ics.uci.edu/b").unwrap();
        ledger.insert("h3", "https://vision.ics.uci.edu/").unwrap();
        ledger.insert("h4", "https://www.example.com/").unwrap();
        ledger.mark_completed("h1", "https://www.ics.uci.edu/a").unwrap();

        let stats = load_statistics(&ledger, &test_scope()).unwrap();
        assert_eq!(stats.total_urls, 4);
        assert_eq!(stats.completed, 1);
        assert_eq!(stats.pending(), 3);
        assert_eq!(stats.subdomains.get("www.ics.uci.edu"), Some(&2));
        assert_eq!(stats.subdomains.get("vision.ics.uci.edu"), Some(&1));
        assert!(!stats.subdomains.contains_key("www.example.com"));
    }
}
