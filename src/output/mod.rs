//! Output module for crawl reports and statistics
//!
//! This module handles:
//! - Tracking word frequencies and the longest page
//! - Writing the plain-text crawl report
//! - Printing ledger statistics for `--stats`

mod report;
pub mod stats;
mod words;

pub use report::{write_report, CrawlReport, TOP_WORDS};
pub use stats::{load_statistics, print_statistics, CrawlStatistics};
pub use words::{meaningful_words, LongestPage, WordStats, WordTracker};
