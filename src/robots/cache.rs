//! Robots.txt caching implementation
//!
//! Entries expire after 24 hours so a long crawl picks up changes made by
//! the site owner.

use crate::robots::ParsedRobots;
use chrono::{DateTime, Duration, Utc};

/// Cached robots.txt data for one origin
#[derive(Debug, Clone)]
pub struct CachedRobots {
    /// The parsed robots.txt content
    pub robots: ParsedRobots,

    /// When the robots.txt was fetched
    pub fetched_at: DateTime<Utc>,
}

impl CachedRobots {
    /// Wraps freshly fetched robots.txt with the current timestamp
    pub fn new(robots: ParsedRobots) -> Self {
        Self {
            robots,
            fetched_at: Utc::now(),
        }
    }

    /// Checks if the cached robots.txt is older than 24 hours
    pub fn is_stale(&self) -> bool {
        self.age() > Duration::hours(24)
    }

    /// Returns how long ago the robots.txt was fetched
    pub fn age(&self) -> Duration {
        Utc::now() - self.fetched_at
    }
}
