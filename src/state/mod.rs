//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `DomainState`: per-domain politeness clock and pending URL FIFO
//! - `UrlOutcome`: how a worker retired a URL

mod domain_state;
mod outcome;

pub use domain_state::{DomainState, QueuedUrl, MAX_CRAWL_DELAY};
pub use outcome::UrlOutcome;
