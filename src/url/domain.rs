use url::Url;

/// Returns the politeness key for a URL: the lowercase host plus any explicit port
///
/// Two URLs share a politeness window exactly when their keys are equal.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use sumi_sweep::url::domain_key;
///
/// let url = Url::parse("https://Vision.ICS.uci.edu/path").unwrap();
/// assert_eq!(domain_key(&url), Some("vision.ics.uci.edu".to_string()));
///
/// let url = Url::parse("http://127.0.0.1:8080/").unwrap();
/// assert_eq!(domain_key(&url), Some("127.0.0.1:8080".to_string()));
/// ```
pub fn domain_key(url: &Url) -> Option<String> {
    let host = url.host_str()?.to_lowercase();
    Some(match url.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host,
    })
}

/// Returns `scheme://host[:port]`, the unit robots.txt is fetched for
pub fn origin(url: &Url) -> String {
    url.origin().ascii_serialization()
}
