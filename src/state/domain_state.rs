use std::collections::VecDeque;
use std::time::{Duration, Instant};
use url::Url;

/// Longest politeness delay honored for any domain
///
/// robots.txt `Crawl-delay` values above this are clamped to it.
pub const MAX_CRAWL_DELAY: Duration = Duration::from_secs(60);

/// A URL waiting in a domain's FIFO, tagged with its discovery sequence
#[derive(Debug, Clone)]
pub struct QueuedUrl {
    pub seq: u64,
    pub url: Url,
}

/// Tracks the politeness state of one domain during crawling
///
/// Lives only in memory; after a restart every domain starts eligible.
#[derive(Debug, Clone, Default)]
pub struct DomainState {
    /// When a URL for this domain was last handed to a worker
    pub last_access: Option<Instant>,

    /// Crawl delay learned from the domain's robots.txt
    pub crawl_delay: Option<Duration>,

    /// URLs for this domain in discovery order
    pub pending: VecDeque<QueuedUrl>,
}

impl DomainState {
    /// Returns the delay enforced between hand-outs for this domain
    ///
    /// The larger of the configured base delay and any robots.txt delay.
    pub fn effective_delay(&self, base: Duration) -> Duration {
        self.crawl_delay
            .map_or(base, |delay| delay.min(MAX_CRAWL_DELAY).max(base))
    }

    /// Returns the earliest instant a URL for this domain may be handed out
    ///
    /// `None` means the domain has never been accessed and is eligible now.
    pub fn ready_at(&self, base: Duration) -> Option<Instant> {
        let delay = self.effective_delay(base);
        self.last_access.map(|last| {
            last.checked_add(delay)
                .or_else(|| last.checked_add(MAX_CRAWL_DELAY))
                .unwrap_or(last)
        })
    }

    /// Checks if a URL for this domain may be handed out at `now`
    pub fn can_request(&self, base: Duration, now: Instant) -> bool {
        self.ready_at(base).map_or(true, |ready| ready <= now)
    }

    /// Records that a URL for this domain was handed out
    pub fn record_request(&mut self, now: Instant) {
        self.last_access = Some(now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: Duration = Duration::from_millis(500);

    #[test]
    fn test_new_domain_is_eligible() {
        let state = DomainState::default();
        let now = Instant::now();

        assert!(state.can_request(BASE, now));
        assert_eq!(state.ready_at(BASE), None);
    }

    #[test]
    fn test_window_after_request() {
        let mut state = DomainState::default();
        let start = Instant::now();
        state.record_request(start);

        assert!(!state.can_request(BASE, start));
        assert!(!state.can_request(BASE, start + Duration::from_millis(499)));
        assert!(state.can_request(BASE, start + BASE));
        assert_eq!(state.ready_at(BASE), Some(start + BASE));
    }

    #[test]
    fn test_robots_delay_only_lengthens_window() {
        let mut state = DomainState::default();

        state.crawl_delay = Some(Duration::from_secs(2));
        assert_eq!(state.effective_delay(BASE), Duration::from_secs(2));

        state.crawl_delay = Some(Duration::from_millis(100));
        assert_eq!(state.effective_delay(BASE), BASE);
    }

    #[test]
    fn test_huge_robots_delay_is_clamped() {
        let mut state = DomainState::default();
        state.crawl_delay = Some(Duration::MAX);
        assert_eq!(state.effective_delay(BASE), MAX_CRAWL_DELAY);

        let start = Instant::now();
        state.record_request(start);
        assert_eq!(state.ready_at(BASE), Some(start + MAX_CRAWL_DELAY));
        assert!(!state.can_request(BASE, start + Duration::from_secs(1)));
    }
}
