//! Robots.txt handling module
//!
//! robots.txt is fetched once per origin and cached for a day. Any failure
//! to obtain it (network error, non-success status, unreadable body) is
//! treated as "everything allowed, no crawl delay".

mod cache;
mod parser;

pub use cache::CachedRobots;
pub use parser::ParsedRobots;

use crate::url::origin;
use crate::{Result, SweepError};
use reqwest::Client;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;
use url::Url;

/// What robots.txt says about one URL
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RobotsVerdict {
    pub allowed: bool,
    pub crawl_delay: Option<Duration>,
}

/// Fetches robots.txt for an origin
///
/// # Arguments
///
/// * `client` - The HTTP client (already carrying the crawler's user agent)
/// * `origin` - `scheme://host[:port]` of the site
///
/// # Returns
///
/// The parsed robots.txt, or an allow-all policy if it could not be fetched
pub async fn fetch_robots(client: &Client, origin: &str) -> ParsedRobots {
    let robots_url = format!("{}/robots.txt", origin);

    let response = match client.get(&robots_url).send().await {
        Ok(response) => response,
        Err(e) => {
            tracing::debug!("robots.txt unavailable at {}: {}", robots_url, e);
            return ParsedRobots::allow_all();
        }
    };

    if !response.status().is_success() {
        tracing::debug!(
            "robots.txt at {} returned {}, allowing all",
            robots_url,
            response.status()
        );
        return ParsedRobots::allow_all();
    }

    match response.text().await {
        Ok(body) => ParsedRobots::from_content(&body),
        Err(e) => {
            tracing::debug!("robots.txt body unreadable at {}: {}", robots_url, e);
            ParsedRobots::allow_all()
        }
    }
}

/// Per-origin robots.txt cache shared by all workers
pub struct RobotsCache {
    client: Client,
    user_agent: String,
    entries: Mutex<HashMap<String, CachedRobots>>,
}

impl RobotsCache {
    /// Creates an empty cache
    ///
    /// # Arguments
    ///
    /// * `client` - HTTP client used to fetch robots.txt
    /// * `user_agent` - Product token matched against `User-agent` lines
    pub fn new(client: Client, user_agent: &str) -> Self {
        Self {
            client,
            user_agent: user_agent.to_string(),
            entries: Mutex::new(HashMap::new()),
        }
    }

    fn cached(&self, origin: &str) -> Result<Option<ParsedRobots>> {
        let entries = self
            .entries
            .lock()
            .map_err(|_| SweepError::LockPoisoned("robots cache"))?;
        Ok(entries
            .get(origin)
            .filter(|entry| !entry.is_stale())
            .map(|entry| entry.robots.clone()))
    }

    /// Checks a URL against its origin's robots.txt, fetching it if needed
    ///
    /// The cache lock is not held while fetching, so two workers may fetch
    /// the same file concurrently; the later result wins.
    pub async fn check(&self, url: &Url) -> Result<RobotsVerdict> {
        let origin = origin(url);

        let robots = match self.cached(&origin)? {
            Some(robots) => robots,
            None => {
                let robots = fetch_robots(&self.client, &origin).await;
                self.entries
                    .lock()
                    .map_err(|_| SweepError::LockPoisoned("robots cache"))?
                    .insert(origin, CachedRobots::new(robots.clone()));
                robots
            }
        };

        Ok(RobotsVerdict {
            allowed: robots.is_allowed(url.as_str(), &self.user_agent),
            crawl_delay: robots.crawl_delay(&self.user_agent),
        })
    }

    /// Number of origins currently cached
    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
