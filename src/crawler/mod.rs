//! Crawler module for web page fetching and processing
//!
//! This module contains the crawling machinery built on top of the frontier:
//! - HTTP fetching under the download policy
//! - HTML parsing for links and visible text
//! - The worker loop and the status sampler
//! - Overall crawl coordination

mod coordinator;
mod fetcher;
mod parser;
mod sampler;
mod worker;

pub use coordinator::{run_crawl, Crawler, RunSummary};
pub use fetcher::{build_http_client, fetch_url, is_html, FetchResult};
pub use parser::{parse_html, ParsedPage};
pub use sampler::{log_status, persist, run_sampler};
pub use worker::{CrawlContext, Worker};
