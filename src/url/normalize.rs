use crate::UrlError;
use sha2::{Digest, Sha256};
use url::Url;

/// Query parameters that never change page content
const TRACKING_PARAMS: &[&str] = &["fbclid", "gclid", "mc_eid", "msclkid"];

/// Normalizes a URL into the canonical form used for ledger keys
///
/// # Normalization Steps
///
/// 1. Parse the URL; reject if malformed
/// 2. Reject schemes other than http and https
/// 3. Lowercase the host (scheme and default ports are folded by the parser)
/// 4. Normalize path:
///    - Remove dot segments (. and ..) and empty segments
///    - Remove trailing slash (except for root /)
///    - Empty path becomes /
/// 5. Remove fragment (everything after #)
/// 6. Remove tracking query parameters and sort the rest by key
/// 7. Remove empty query string (trailing ?)
///
/// # Arguments
///
/// * `url_str` - The URL string to normalize
///
/// # Returns
///
/// * `Ok(Url)` - Normalized URL
/// * `Err(UrlError)` - Failed to parse or normalize the URL
///
/// # Examples
///
/// ```
/// use sumi_sweep::url::normalize_url;
///
/// let url = normalize_url("HTTP://WWW.ICS.UCI.EDU:80/a/./b/?utm_source=x#top").unwrap();
/// assert_eq!(url.as_str(), "http://www.ics.uci.edu/a/b");
/// ```
pub fn normalize_url(url_str: &str) -> Result<Url, UrlError> {
    let mut url = Url::parse(url_str.trim()).map_err(|e| UrlError::Parse(e.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    let host = url
        .host_str()
        .filter(|h| !h.is_empty())
        .ok_or(UrlError::MissingDomain)?
        .to_lowercase();
    url.set_host(Some(&host))
        .map_err(|e| UrlError::Malformed(format!("Failed to set host: {}", e)))?;

    let normalized_path = normalize_path(url.path());
    url.set_path(&normalized_path);

    url.set_fragment(None);

    if url.query().is_some() {
        let params = filter_and_sort_query_params(&url);
        if params.is_empty() {
            url.set_query(None);
        } else {
            url.query_pairs_mut().clear().extend_pairs(params);
        }
    }

    Ok(url)
}

/// Computes the stable ledger key for a normalized URL
///
/// The key is the hex SHA-256 of `host[:port] + path + ["?" + query]`.
/// The scheme is excluded so that http and https spellings of a page
/// share one record.
pub fn url_hash(url: &Url) -> String {
    let mut hasher = Sha256::new();
    hasher.update(url.host_str().unwrap_or_default().as_bytes());
    if let Some(port) = url.port() {
        hasher.update(format!(":{}", port).as_bytes());
    }
    hasher.update(url.path().as_bytes());
    if let Some(query) = url.query() {
        hasher.update(b"?");
        hasher.update(query.as_bytes());
    }
    hex::encode(hasher.finalize())
}

/// Normalizes a URL path by removing dot segments and trailing slashes
fn normalize_path(path: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();

    for segment in path.split('/') {
        match segment {
            "" | "." => continue,
            ".." => {
                segments.pop();
            }
            _ => segments.push(segment),
        }
    }

    // Joining the kept segments drops the trailing slash for free
    format!("/{}", segments.join("/"))
}

/// Filters out tracking parameters and sorts remaining query parameters
fn filter_and_sort_query_params(url: &Url) -> Vec<(String, String)> {
    let mut params: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| !is_tracking_param(key))
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    params.sort();
    params
}

fn is_tracking_param(key: &str) -> bool {
    key.starts_with("utm_") || TRACKING_PARAMS.contains(&key)
}
