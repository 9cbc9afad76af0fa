use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure for Sumi-Sweep
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default)]
    pub dedup: DedupConfig,
    pub scope: ScopeConfig,
    pub output: OutputConfig,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Number of concurrent workers draining the frontier
    pub workers: u32,

    /// Minimum time between requests to the same domain (milliseconds)
    #[serde(rename = "crawl-delay")]
    pub crawl_delay: u64,

    /// URLs added to an empty ledger
    pub seeds: Vec<String>,

    /// Flush the ledger after this many crawled pages per worker
    #[serde(rename = "sync-every", default = "default_sync_every")]
    pub sync_every: u32,

    /// Consecutive empty-frontier observations before a worker exits
    #[serde(rename = "empty-queue-retries", default = "default_empty_queue_retries")]
    pub empty_queue_retries: u32,

    /// Sleep between empty-frontier observations (milliseconds)
    #[serde(rename = "empty-queue-backoff", default = "default_empty_queue_backoff")]
    pub empty_queue_backoff: u64,
}

impl CrawlerConfig {
    pub fn crawl_delay(&self) -> Duration {
        Duration::from_millis(self.crawl_delay)
    }

    pub fn empty_queue_backoff(&self) -> Duration {
        Duration::from_millis(self.empty_queue_backoff)
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: String,

    /// Email address for crawler-related contact
    #[serde(rename = "contact-email")]
    pub contact_email: String,
}

impl UserAgentConfig {
    /// Formats the full user agent header value
    ///
    /// Format: `CrawlerName/Version (+ContactURL; ContactEmail)`
    pub fn header_value(&self) -> String {
        format!(
            "{}/{} (+{}; {})",
            self.crawler_name, self.crawler_version, self.contact_url, self.contact_email
        )
    }
}

/// Download policy configuration
#[derive(Debug, Clone, Deserialize)]
pub struct FetchConfig {
    /// TCP connect timeout (milliseconds)
    #[serde(rename = "connect-timeout", default = "default_connect_timeout")]
    pub connect_timeout: u64,

    /// Whole-request timeout (milliseconds)
    #[serde(rename = "read-timeout", default = "default_read_timeout")]
    pub read_timeout: u64,

    /// Send a HEAD request before the GET and skip pages it rejects
    #[serde(rename = "head-check", default = "default_head_check")]
    pub head_check: bool,

    /// Pages declaring or delivering more bytes than this are skipped
    #[serde(rename = "max-content-length", default = "default_max_content_length")]
    pub max_content_length: u64,

    /// Pages delivering fewer bytes than this are skipped
    #[serde(rename = "min-content-length", default = "default_min_content_length")]
    pub min_content_length: u64,

    /// Pages with fewer meaningful words than this are not followed
    #[serde(rename = "min-words", default = "default_min_words")]
    pub min_words: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            connect_timeout: default_connect_timeout(),
            read_timeout: default_read_timeout(),
            head_check: default_head_check(),
            max_content_length: default_max_content_length(),
            min_content_length: default_min_content_length(),
            min_words: default_min_words(),
        }
    }
}

/// Duplicate detection configuration
#[derive(Debug, Clone, Deserialize)]
pub struct DedupConfig {
    /// Jaccard similarity at or above which a page is a near duplicate
    #[serde(rename = "near-duplicate-threshold", default = "default_threshold")]
    pub near_duplicate_threshold: f64,
}

impl Default for DedupConfig {
    fn default() -> Self {
        Self {
            near_duplicate_threshold: default_threshold(),
        }
    }
}

/// Crawl scope configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ScopeConfig {
    /// Assigned domain patterns (e.g., "example.edu" or "*.example.edu")
    #[serde(default)]
    pub domains: Vec<String>,

    /// Hosts that are only in scope below a path prefix
    #[serde(rename = "path-restricted", default)]
    pub path_restricted: Vec<PathRestriction>,

    /// URLs longer than this are treated as traps
    #[serde(rename = "max-url-length", default = "default_max_url_length")]
    pub max_url_length: usize,

    /// URLs with more query parameters than this are treated as traps
    #[serde(rename = "max-query-params", default = "default_max_query_params")]
    pub max_query_params: usize,

    /// URLs with more path separators than this are treated as traps
    #[serde(rename = "max-path-depth", default = "default_max_path_depth")]
    pub max_path_depth: usize,
}

/// A host that is in scope only under a path prefix
#[derive(Debug, Clone, Deserialize)]
pub struct PathRestriction {
    pub host: String,

    #[serde(rename = "path-prefix")]
    pub path_prefix: String,
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path to the SQLite URL ledger
    #[serde(rename = "ledger-path")]
    pub ledger_path: String,

    /// Path to the duplicate detector snapshot
    #[serde(rename = "dedup-path")]
    pub dedup_path: String,

    /// Path to the word statistics snapshot
    #[serde(rename = "stats-path")]
    pub stats_path: String,

    /// Path to the human-readable crawl report
    #[serde(rename = "report-path")]
    pub report_path: String,

    /// Seconds between status samples
    #[serde(rename = "status-interval", default = "default_status_interval")]
    pub status_interval: u64,
}

impl OutputConfig {
    pub fn status_interval(&self) -> Duration {
        Duration::from_secs(self.status_interval)
    }
}

fn default_sync_every() -> u32 {
    10
}

fn default_empty_queue_retries() -> u32 {
    3
}

fn default_empty_queue_backoff() -> u64 {
    5_000
}

fn default_connect_timeout() -> u64 {
    3_000
}

fn default_read_timeout() -> u64 {
    5_000
}

fn default_head_check() -> bool {
    true
}

fn default_max_content_length() -> u64 {
    10 * 1024 * 1024
}

fn default_min_content_length() -> u64 {
    100
}

fn default_min_words() -> usize {
    10
}

fn default_threshold() -> f64 {
    0.9
}

fn default_max_url_length() -> usize {
    300
}

fn default_max_query_params() -> usize {
    5
}

fn default_max_path_depth() -> usize {
    10
}

fn default_status_interval() -> u64 {
    120
}
