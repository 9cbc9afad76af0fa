/// How a worker retired a URL
///
/// Every URL handed out by the frontier ends in exactly one of these
/// outcomes and is then marked complete. None of them re-queue the URL.
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum UrlOutcome {
    // ===== Success =====
    /// Page was fetched, judged original, and its links were enqueued
    Crawled {
        /// Links extracted from the page
        links_found: usize,
        /// Links that were new to the frontier
        links_added: usize,
    },

    // ===== Skips =====
    /// robots.txt disallows the URL for our user agent
    Disallowed,

    /// The HEAD pre-check answered outside 200..=399
    HeadRejected(u16),

    /// Declared or delivered body exceeds the size limit
    Oversized(u64),

    /// Delivered body is below the minimum size
    Undersized(u64),

    /// Content-Type is not HTML
    ContentMismatch,

    /// Too few meaningful words to be worth following
    LowInformation(usize),

    /// Same text as a page already seen
    ExactDuplicate,

    /// Shingle overlap with an earlier page reached the threshold
    NearDuplicate { of: String, similarity: f64 },

    // ===== Errors =====
    /// Non-success HTTP status on the GET
    HttpError(u16),

    /// Connection, TLS, DNS, or timeout failure
    FetchFailed(String),
}

impl UrlOutcome {
    /// Returns true if the page content was accepted and followed
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Crawled { .. })
    }

    /// Returns true if this represents a transport or HTTP failure
    pub fn is_error(&self) -> bool {
        matches!(self, Self::HttpError(_) | Self::FetchFailed(_))
    }

    /// Returns true if retiring this URL involved a request to its host
    ///
    /// Only these outcomes are followed by the politeness sleep.
    pub fn made_request(&self) -> bool {
        !matches!(self, Self::Disallowed)
    }
}

impl fmt::Display for UrlOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Crawled {
                links_found,
                links_added,
            } => write!(f, "crawled ({} links, {} new)", links_found, links_added),
            Self::Disallowed => write!(f, "disallowed by robots.txt"),
            Self::HeadRejected(status) => write!(f, "HEAD rejected with {}", status),
            Self::Oversized(bytes) => write!(f, "oversized ({} bytes)", bytes),
            Self::Undersized(bytes) => write!(f, "undersized ({} bytes)", bytes),
            Self::ContentMismatch => write!(f, "not html"),
            Self::LowInformation(words) => write!(f, "low information ({} words)", words),
            Self::ExactDuplicate => write!(f, "exact duplicate"),
            Self::NearDuplicate { of, similarity } => {
                write!(f, "near duplicate of {} ({:.2})", of, similarity)
            }
            Self::HttpError(status) => write!(f, "HTTP {}", status),
            Self::FetchFailed(error) => write!(f, "fetch failed: {}", error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification_helpers() {
        let crawled = UrlOutcome::Crawled {
            links_found: 3,
            links_added: 1,
        };
        assert!(crawled.is_success());
        assert!(!crawled.is_error());

        assert!(UrlOutcome::HttpError(404).is_error());
        assert!(UrlOutcome::FetchFailed("timeout".into()).is_error());
        assert!(!UrlOutcome::ExactDuplicate.is_error());
        assert!(!UrlOutcome::NearDuplicate {
            of: "http://a.edu/".into(),
            similarity: 0.95
        }
        .is_success());
    }

    #[test]
    fn test_disallowed_makes_no_request() {
        assert!(!UrlOutcome::Disallowed.made_request());
        assert!(UrlOutcome::HttpError(500).made_request());
        assert!(UrlOutcome::ExactDuplicate.made_request());
    }

    #[test]
    fn test_display() {
        assert_eq!(UrlOutcome::HttpError(404).to_string(), "HTTP 404");
        assert_eq!(
            UrlOutcome::NearDuplicate {
                of: "http://a.edu/x".into(),
                similarity: 0.934
            }
            .to_string(),
            "near duplicate of http://a.edu/x (0.93)"
        );
    }
}
