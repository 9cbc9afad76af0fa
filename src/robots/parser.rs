//! Robots.txt parser implementation
//!
//! Allow/disallow matching is delegated to the robotstxt crate. That crate
//! does not expose `Crawl-delay`, so the delay is read by a small group-aware
//! line parser here.

use crate::state::MAX_CRAWL_DELAY;
use robotstxt::DefaultMatcher;
use std::time::Duration;

/// Parsed robots.txt data
#[derive(Debug, Clone, Default)]
pub struct ParsedRobots {
    /// Raw robots.txt content (empty string means allow all)
    content: String,
}

impl ParsedRobots {
    /// Creates a new ParsedRobots from raw robots.txt content
    pub fn from_content(content: &str) -> Self {
        Self {
            content: content.to_string(),
        }
    }

    /// Creates a permissive ParsedRobots that allows everything
    ///
    /// This is used when robots.txt cannot be fetched.
    pub fn allow_all() -> Self {
        Self::default()
    }

    /// Checks if a URL is allowed for the given user agent
    ///
    /// # Arguments
    ///
    /// * `url` - The absolute URL to check
    /// * `user_agent` - The crawler's product token (e.g. "SumiSweep")
    pub fn is_allowed(&self, url: &str, user_agent: &str) -> bool {
        if self.content.trim().is_empty() {
            return true;
        }

        let mut matcher = DefaultMatcher::default();
        matcher.one_agent_allowed_by_robots(&self.content, user_agent, url)
    }

    /// Gets the crawl delay for a specific user agent
    ///
    /// A group naming the agent wins over the `*` group. Negative or
    /// unparsable values are ignored and large ones are clamped to
    /// `MAX_CRAWL_DELAY`.
    pub fn crawl_delay(&self, user_agent: &str) -> Option<Duration> {
        let agent = user_agent.to_lowercase();

        let mut group: Vec<String> = Vec::new();
        let mut in_agent_lines = false;
        let mut for_agent = None;
        let mut for_wildcard = None;

        for line in self.content.lines() {
            let line = line.split('#').next().unwrap_or_default().trim();
            let (key, value) = match line.split_once(':') {
                Some((key, value)) => (key.trim().to_lowercase(), value.trim()),
                None => continue,
            };

            if key == "user-agent" {
                // Consecutive User-agent lines share one group
                if !in_agent_lines {
                    group.clear();
                }
                if !value.is_empty() {
                    group.push(value.to_lowercase());
                }
                in_agent_lines = true;
                continue;
            }
            in_agent_lines = false;

            if key != "crawl-delay" {
                continue;
            }

            let delay = match value
                .parse::<f64>()
                .ok()
                .filter(|secs| !secs.is_nan())
                .map(|secs| secs.min(MAX_CRAWL_DELAY.as_secs_f64()))
                .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
            {
                Some(delay) => delay,
                None => continue,
            };

            if group.iter().any(|ua| ua != "*" && agent.contains(ua.as_str())) {
                for_agent.get_or_insert(delay);
            } else if group.iter().any(|ua| ua == "*") {
                for_wildcard.get_or_insert(delay);
            }
        }

        for_agent.or(for_wildcard)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const AGENT: &str = "SumiSweep";

    #[test]
    fn test_allow_all() {
        let robots = ParsedRobots::allow_all();
        assert!(robots.is_allowed("https://ics.uci.edu/any/path", AGENT));
        assert_eq!(robots.crawl_delay(AGENT), None);
    }

    #[test]
    fn test_disallow_all() {
        let robots = ParsedRobots::from_content("User-agent: *\nDisallow: /");
        assert!(!robots.is_allowed("https://ics.uci.edu/", AGENT));
        assert!(!robots.is_allowed("https://ics.uci.edu/page", AGENT));
    }

    #[test]
    fn test_disallow_prefix() {
        let robots = ParsedRobots::from_content("User-agent: *\nDisallow: /private/");
        assert!(robots.is_allowed("https://ics.uci.edu/public", AGENT));
        assert!(!robots.is_allowed("https://ics.uci.edu/private/data", AGENT));
    }

    #[test]
    fn test_specific_agent_group() {
        let robots = ParsedRobots::from_content(
            "User-agent: SumiSweep\nDisallow: /\n\nUser-agent: *\nDisallow:",
        );
        assert!(!robots.is_allowed("https://ics.uci.edu/page", AGENT));
        assert!(robots.is_allowed("https://ics.uci.edu/page", "OtherBot"));
    }

    #[test]
    fn test_garbage_allows() {
        let robots = ParsedRobots::from_content("<html>not a robots file</html>");
        assert!(robots.is_allowed("https://ics.uci.edu/page", AGENT));
    }

    #[test]
    fn test_crawl_delay_wildcard() {
        let robots = ParsedRobots::from_content("User-agent: *\nCrawl-delay: 5\nDisallow: /x");
        assert_eq!(robots.crawl_delay(AGENT), Some(Duration::from_secs(5)));
    }

    #[test]
    fn test_crawl_delay_after_disallow() {
        let robots = ParsedRobots::from_content("User-agent: *\nDisallow: /x\nCrawl-delay: 2");
        assert_eq!(robots.crawl_delay(AGENT), Some(Duration::from_secs(2)));
    }

    #[test]
    fn test_crawl_delay_specific_agent_preferred() {
        let robots = ParsedRobots::from_content(
            "User-agent: *\nCrawl-delay: 2\n\nUser-agent: sumisweep\nCrawl-delay: 10",
        );
        assert_eq!(robots.crawl_delay(AGENT), Some(Duration::from_secs(10)));
        assert_eq!(robots.crawl_delay("OtherBot"), Some(Duration::from_secs(2)));
    }

    #[test]
    fn test_crawl_delay_groups_do_not_leak() {
        let robots = ParsedRobots::from_content(
            "User-agent: OtherBot\nDisallow: /\n\nUser-agent: *\nDisallow: /tmp\n\nUser-agent: OtherBot\nCrawl-delay: 30",
        );
        assert_eq!(robots.crawl_delay(AGENT), None);
    }

    #[test]
    fn test_crawl_delay_decimal_and_invalid() {
        let robots = ParsedRobots::from_content("User-agent: *\nCrawl-delay: 0.5");
        assert_eq!(robots.crawl_delay(AGENT), Some(Duration::from_millis(500)));

        let robots = ParsedRobots::from_content("User-agent: *\nCrawl-delay: -3");
        assert_eq!(robots.crawl_delay(AGENT), None);

        let robots = ParsedRobots::from_content("User-agent: *\nCrawl-delay: soon");
        assert_eq!(robots.crawl_delay(AGENT), None);
    }

    #[test]
    fn test_comments_ignored() {
        let robots =
            ParsedRobots::from_content("# hello\nUser-agent: * # everyone\nCrawl-delay: 3 # slow");
        assert_eq!(robots.crawl_delay(AGENT), Some(Duration::from_secs(3)));
    }

    #[test]
    fn test_huge_crawl_delay_is_clamped() {
        let robots =
            ParsedRobots::from_content("User-agent: *\nCrawl-delay: 10000000000000000000");
        assert_eq!(robots.crawl_delay(AGENT), Some(MAX_CRAWL_DELAY));

        let robots = ParsedRobots::from_content("User-agent: *\nCrawl-delay: 1e300");
        assert_eq!(robots.crawl_delay(AGENT), Some(MAX_CRAWL_DELAY));

        let robots = ParsedRobots::from_content("User-agent: *\nCrawl-delay: NaN");
        assert_eq!(robots.crawl_delay(AGENT), None);
    }

    #[test]
    fn test_blank_user_agent_matches_nobody() {
        let robots = ParsedRobots::from_content("User-agent:\nCrawl-delay: 30");
        assert_eq!(robots.crawl_delay(AGENT), None);

        let robots = ParsedRobots::from_content(
            "User-agent:\nCrawl-delay: 30\n\nUser-agent: *\nCrawl-delay: 2",
        );
        assert_eq!(robots.crawl_delay(AGENT), Some(Duration::from_secs(2)));
    }
}
