use crate::config::{PathRestriction, ScopeConfig};
use crate::ConfigError;
use regex::Regex;
use url::Url;

/// Dates embedded in paths or queries mark calendar pages that never end
const CALENDAR_PATTERN: &str = r"\d{4}[-/]\d{2}[-/]\d{2}";

/// Extensions of resources that are never HTML
const BINARY_EXTENSION_PATTERN: &str = concat!(
    r"\.(css|js|bmp|gif|jpe?g|ico|png|tiff?|mid|mp2|mp3|mp4",
    r"|wav|avi|mov|mpeg|ram|m4v|mkv|ogg|ogv|pdf|ps|eps|tex|ppt|pptx",
    r"|doc|docx|xls|xlsx|names|data|dat|exe|bz2|tar|msi|bin|7z|psd|dmg|iso",
    r"|epub|dll|cnf|tgz|sha1|thmx|mso|arff|rtf|jar|csv",
    r"|rm|smil|wmv|swf|wma|zip|rar|gz)$"
);

/// Checks if a host matches a domain pattern
///
/// `"*.uci.edu"` matches any host below `uci.edu` but not `uci.edu` itself;
/// list the bare host as its own pattern to include it. A pattern without
/// the `*.` prefix matches only that exact host.
pub fn matches_wildcard(pattern: &str, host: &str) -> bool {
    match pattern.strip_prefix("*.") {
        Some(base) => host
            .strip_suffix(base)
            .map_or(false, |rest| rest.len() > 1 && rest.ends_with('.')),
        None => host == pattern,
    }
}

/// The set of URLs this crawl is allowed to visit
///
/// A URL is in scope when its host is assigned (a domain pattern or a
/// path-restricted host with a matching path prefix) and it passes every
/// trap filter.
#[derive(Debug, Clone)]
pub struct Scope {
    domains: Vec<String>,
    path_restricted: Vec<PathRestriction>,
    max_url_length: usize,
    max_query_params: usize,
    max_path_depth: usize,
    calendar: Regex,
    binary_extension: Regex,
}

impl Scope {
    /// Builds the scope predicate from configuration
    pub fn from_config(config: &ScopeConfig) -> Result<Self, ConfigError> {
        let compile = |pattern: &str| {
            Regex::new(pattern).map_err(|e| ConfigError::InvalidPattern(e.to_string()))
        };

        Ok(Self {
            domains: config.domains.iter().map(|d| d.to_lowercase()).collect(),
            path_restricted: config
                .path_restricted
                .iter()
                .map(|rule| PathRestriction {
                    host: rule.host.to_lowercase(),
                    path_prefix: rule.path_prefix.clone(),
                })
                .collect(),
            max_url_length: config.max_url_length,
            max_query_params: config.max_query_params,
            max_path_depth: config.max_path_depth,
            calendar: compile(CALENDAR_PATTERN)?,
            binary_extension: compile(BINARY_EXTENSION_PATTERN)?,
        })
    }

    /// Returns true if the host belongs to one of the assigned domains
    ///
    /// Path-restricted hosts count as assigned for reporting purposes.
    pub fn is_assigned_host(&self, host: &str) -> bool {
        self.domains.iter().any(|p| matches_wildcard(p, host))
            || self.path_restricted.iter().any(|r| r.host == host)
    }

    /// Returns true if the URL may be added to the frontier
    pub fn is_in_scope(&self, url: &Url) -> bool {
        if url.scheme() != "http" && url.scheme() != "https" {
            return false;
        }

        let host = match url.host_str() {
            Some(host) => host,
            None => return false,
        };

        let path = url.path();
        let assigned = self.domains.iter().any(|p| matches_wildcard(p, host))
            || self
                .path_restricted
                .iter()
                .any(|r| r.host == host && path.starts_with(&r.path_prefix));

        assigned && self.trap_reason(url).is_none()
    }

    /// Names the first trap filter the URL trips, if any
    pub fn trap_reason(&self, url: &Url) -> Option<&'static str> {
        let text = url.as_str();
        if text.len() > self.max_url_length {
            return Some("url too long");
        }

        let path = url.path().to_lowercase();
        if path.matches('/').count() > self.max_path_depth {
            return Some("path too deep");
        }

        if self.binary_extension.is_match(&path) {
            return Some("non-html extension");
        }

        if self.calendar.is_match(text) {
            return Some("calendar date");
        }

        if url.query().is_some() {
            let mut count = 0;
            for (key, value) in url.query_pairs() {
                count += 1;
                let key = key.to_lowercase();
                if key == "version" || (key == "action" && value.eq_ignore_ascii_case("download")) {
                    return Some("download or version parameter");
                }
            }
            if count > self.max_query_params {
                return Some("too many query parameters");
            }
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_scope() -> Scope {
        let config = ScopeConfig {
            domains: vec!["*.ics.uci.edu".to_string(), "*.stat.uci.edu".to_string()],
            path_restricted: vec![PathRestriction {
                host: "today.uci.edu".to_string(),
                path_prefix: "/department/information_computer_sciences".to_string(),
            }],
            max_url_length: 300,
            max_query_params: 5,
            max_path_depth: 10,
        };
        Scope::from_config(&config).unwrap()
    }

    fn in_scope(scope: &Scope, url: &str) -> bool {
        scope.is_in_scope(&Url::parse(url).unwrap())
    }

    #[test]
    fn test_wildcard_matching() {
        assert!(!matches_wildcard("*.uci.edu", "uci.edu"));
        assert!(!matches_wildcard("*.uci.edu", ".uci.edu"));
        assert!(matches_wildcard("*.uci.edu", "ics.uci.edu"));
        assert!(matches_wildcard("*.uci.edu", "a.b.uci.edu"));
        assert!(!matches_wildcard("*.uci.edu", "notuci.edu"));
        assert!(!matches_wildcard("*.uci.edu", "uci.edu.evil.com"));
        assert!(matches_wildcard("ics.uci.edu", "ics.uci.edu"));
        assert!(!matches_wildcard("ics.uci.edu", "www.ics.uci.edu"));
    }

    #[test]
    fn test_assigned_domains() {
        let scope = test_scope();
        assert!(in_scope(&scope, "https://www.ics.uci.edu/about"));
        assert!(in_scope(&scope, "http://www.stat.uci.edu/"));
        assert!(!in_scope(&scope, "https://www.uci.edu/"));
        assert!(!in_scope(&scope, "https://example.com/"));
    }

    #[test]
    fn test_bare_host_needs_its_own_pattern() {
        let scope = test_scope();
        assert!(!in_scope(&scope, "http://stat.uci.edu/"));
        assert!(!in_scope(&scope, "https://ics.uci.edu/about"));

        let config = ScopeConfig {
            domains: vec!["*.ics.uci.edu".to_string(), "ics.uci.edu".to_string()],
            path_restricted: vec![],
            max_url_length: 300,
            max_query_params: 5,
            max_path_depth: 10,
        };
        let scope = Scope::from_config(&config).unwrap();
        assert!(in_scope(&scope, "https://ics.uci.edu/about"));
        assert!(in_scope(&scope, "https://vision.ics.uci.edu/about"));
    }

    #[test]
    fn test_path_restricted_host() {
        let scope = test_scope();
        assert!(in_scope(
            &scope,
            "https://today.uci.edu/department/information_computer_sciences/news"
        ));
        assert!(!in_scope(&scope, "https://today.uci.edu/department/physics"));
        assert!(scope.is_assigned_host("today.uci.edu"));
    }

    #[test]
    fn test_non_http_scheme_rejected() {
        let scope = test_scope();
        assert!(!in_scope(&scope, "ftp://www.ics.uci.edu/file"));
    }

    #[test]
    fn test_binary_extensions_rejected() {
        let scope = test_scope();
        assert!(!in_scope(&scope, "https://www.ics.uci.edu/paper.pdf"));
        assert!(!in_scope(&scope, "https://www.ics.uci.edu/img/logo.PNG"));
        assert!(!in_scope(&scope, "https://www.ics.uci.edu/data.tar.gz"));
        assert!(in_scope(&scope, "https://www.ics.uci.edu/page.html"));
    }

    #[test]
    fn test_calendar_trap() {
        let scope = test_scope();
        assert!(!in_scope(&scope, "https://www.ics.uci.edu/events/2023-05-01"));
        assert!(!in_scope(&scope, "https://www.ics.uci.edu/events/2023/05/01"));
        assert!(!in_scope(&scope, "https://www.ics.uci.edu/e?day=2023-05-01"));
    }

    #[test]
    fn test_query_traps() {
        let scope = test_scope();
        assert!(!in_scope(&scope, "https://www.ics.uci.edu/w?action=download"));
        assert!(!in_scope(&scope, "https://www.ics.uci.edu/w?version=3"));
        assert!(!in_scope(
            &scope,
            "https://www.ics.uci.edu/p?a=1&b=2&c=3&d=4&e=5&f=6"
        ));
        assert!(in_scope(&scope, "https://www.ics.uci.edu/p?a=1&b=2&c=3&d=4&e=5"));
        assert!(in_scope(&scope, "https://www.ics.uci.edu/w?action=edit"));
    }

    #[test]
    fn test_query_traps_ignore_case() {
        let scope = test_scope();
        assert!(!in_scope(&scope, "https://www.ics.uci.edu/w?Action=Download"));
        assert!(!in_scope(&scope, "https://www.ics.uci.edu/w?VERSION=3"));
        assert!(!in_scope(&scope, "https://www.ics.uci.edu/w?do=1&action=DOWNLOAD"));
    }

    #[test]
    fn test_length_and_depth_traps() {
        let scope = test_scope();
        let long = format!("https://www.ics.uci.edu/{}", "a".repeat(300));
        assert!(!in_scope(&scope, &long));

        let deep = format!("https://www.ics.uci.edu{}", "/x".repeat(11));
        assert!(!in_scope(&scope, &deep));

        let ok = format!("https://www.ics.uci.edu{}", "/x".repeat(10));
        assert!(in_scope(&scope, &ok));
    }

    #[test]
    fn test_trap_reason_names_filter() {
        let scope = test_scope();
        let url = Url::parse("https://www.ics.uci.edu/slides.pptx").unwrap();
        assert_eq!(scope.trap_reason(&url), Some("non-html extension"));
    }
}
