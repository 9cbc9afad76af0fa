//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building HTTP clients with proper user agent strings and timeouts
//! - The optional HEAD pre-check
//! - GET requests with a bounded body read
//! - Error classification
//!
//! Nothing here retries. A failed fetch retires its URL.

use crate::config::{FetchConfig, UserAgentConfig};
use reqwest::header::{CONTENT_LENGTH, CONTENT_TYPE};
use reqwest::{redirect::Policy, Client, Response};
use std::time::Duration;
use url::Url;

/// Result of a fetch operation
#[derive(Debug)]
pub enum FetchResult {
    /// Successfully fetched the page
    Success {
        /// Final URL after redirects
        final_url: Url,
        /// HTTP status code
        status_code: u16,
        /// Content-Type header value, if any
        content_type: Option<String>,
        /// Page body content
        body: String,
    },

    /// The HEAD pre-check answered outside 200..=399
    HeadRejected {
        status_code: u16,
    },

    /// Declared or delivered size exceeds the configured maximum
    TooLarge {
        bytes: u64,
    },

    /// GET answered with a non-success status
    HttpError {
        status_code: u16,
    },

    /// Network error (connection refused, timeout, etc.)
    NetworkError {
        error: String,
        timed_out: bool,
    },
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `user_agent` - The user agent configuration
/// * `fetch` - Timeouts for every request made with this client
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
///
/// # Example
///
/// ```no_run
/// use sumi_sweep::config::{FetchConfig, UserAgentConfig};
/// use sumi_sweep::crawler::build_http_client;
///
/// let user_agent = UserAgentConfig {
///     crawler_name: "SumiSweep".to_string(),
///     crawler_version: "1.0".to_string(),
///     contact_url: "https://example.com/about".to_string(),
///     contact_email: "admin@example.com".to_string(),
/// };
///
/// let client = build_http_client(&user_agent, &FetchConfig::default()).unwrap();
/// ```
pub fn build_http_client(
    user_agent: &UserAgentConfig,
    fetch: &FetchConfig,
) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(user_agent.header_value())
        .connect_timeout(Duration::from_millis(fetch.connect_timeout))
        .timeout(Duration::from_millis(fetch.read_timeout))
        .redirect(Policy::limited(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches a URL under the configured download policy
///
/// # Request Flow
///
/// 1. If enabled, send HEAD; a status outside 200..=399 or an oversized
///    Content-Length stops here
/// 2. Send GET; a non-success status stops here
/// 3. Reject an oversized Content-Length, then read the body in chunks,
///    stopping as soon as it exceeds the maximum
///
/// # Arguments
///
/// * `client` - The HTTP client to use
/// * `url` - The URL to fetch
/// * `policy` - HEAD pre-check switch and size limit
pub async fn fetch_url(client: &Client, url: &Url, policy: &FetchConfig) -> FetchResult {
    if policy.head_check {
        let head = match client.head(url.clone()).send().await {
            Ok(response) => response,
            Err(e) => return network_error(e),
        };

        let status = head.status();
        if !(status.is_success() || status.is_redirection()) {
            return FetchResult::HeadRejected {
                status_code: status.as_u16(),
            };
        }

        if let Some(declared) = declared_length(&head) {
            if declared > policy.max_content_length {
                return FetchResult::TooLarge { bytes: declared };
            }
        }
    }

    let mut response = match client.get(url.clone()).send().await {
        Ok(response) => response,
        Err(e) => return network_error(e),
    };

    let status = response.status();
    if !status.is_success() {
        return FetchResult::HttpError {
            status_code: status.as_u16(),
        };
    }

    if let Some(declared) = declared_length(&response) {
        if declared > policy.max_content_length {
            return FetchResult::TooLarge { bytes: declared };
        }
    }

    let final_url = response.url().clone();
    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.to_string());

    let mut body = Vec::new();
    loop {
        match response.chunk().await {
            Ok(Some(chunk)) => {
                body.extend_from_slice(&chunk);
                if body.len() as u64 > policy.max_content_length {
                    return FetchResult::TooLarge {
                        bytes: body.len() as u64,
                    };
                }
            }
            Ok(None) => break,
            Err(e) => return network_error(e),
        }
    }

    FetchResult::Success {
        final_url,
        status_code: status.as_u16(),
        content_type,
        body: String::from_utf8_lossy(&body).into_owned(),
    }
}

/// Checks if a Content-Type names an HTML document
///
/// A missing header is accepted.
pub fn is_html(content_type: Option<&str>) -> bool {
    match content_type {
        None => true,
        Some(value) => {
            let value = value.to_ascii_lowercase();
            value.contains("text/html") || value.contains("application/xhtml+xml")
        }
    }
}

fn declared_length(response: &Response) -> Option<u64> {
    response
        .headers()
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse().ok())
}

fn network_error(e: reqwest::Error) -> FetchResult {
    let timed_out = e.is_timeout();
    let error = if timed_out {
        "Request timeout".to_string()
    } else if e.is_connect() {
        "Connection refused".to_string()
    } else {
        e.to_string()
    };
    FetchResult::NetworkError { error, timed_out }
}
