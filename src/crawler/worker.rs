//! Crawl worker loop
//!
//! Each worker repeatedly pulls a URL from the frontier, runs it through
//! robots, fetch, validation, duplicate detection and link extraction, and
//! retires it. Workers share nothing but the [`CrawlContext`].

use crate::config::Config;
use crate::crawler::fetcher::{fetch_url, is_html, FetchResult};
use crate::crawler::parser::parse_html;
use crate::dedup::{Classification, DuplicateDetector};
use crate::frontier::{Dequeue, Frontier};
use crate::output::{meaningful_words, WordTracker};
use crate::robots::RobotsCache;
use crate::state::UrlOutcome;
use crate::url::domain_key;
use crate::Result;
use reqwest::Client;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use url::Url;

/// Longest single sleep while waiting for a domain window to close
///
/// New URLs for other domains may become eligible in the meantime, so the
/// frontier is polled again at least this often.
const MAX_WAIT: Duration = Duration::from_secs(1);

/// State shared by every worker and the sampler
pub struct CrawlContext {
    pub config: Config,
    pub frontier: Frontier,
    pub detector: DuplicateDetector,
    pub words: WordTracker,
    pub robots: RobotsCache,
    pub client: Client,

    /// Workers that have not yet exited
    pub live_workers: AtomicUsize,
}

/// Decrements the live worker count when a worker exits, however it exits
struct LiveGuard<'a>(&'a AtomicUsize);

impl<'a> LiveGuard<'a> {
    fn enter(count: &'a AtomicUsize) -> Self {
        count.fetch_add(1, Ordering::SeqCst);
        Self(count)
    }
}

impl Drop for LiveGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Sleeps for `duration` unless cancelled first
///
/// # Returns
///
/// `true` if the sleep completed, `false` if cancellation interrupted it
async fn sleep_or_cancel(cancel: &CancellationToken, duration: Duration) -> bool {
    tokio::select! {
        _ = cancel.cancelled() => false,
        _ = tokio::time::sleep(duration) => true,
    }
}

/// One crawl worker
pub struct Worker {
    id: usize,
    ctx: Arc<CrawlContext>,
    cancel: CancellationToken,
}

impl Worker {
    pub fn new(id: usize, ctx: Arc<CrawlContext>, cancel: CancellationToken) -> Self {
        Self { id, ctx, cancel }
    }

    /// Runs until the frontier stays empty, cancellation, or a storage error
    ///
    /// # Returns
    ///
    /// The number of URLs this worker retired
    pub async fn run(self) -> Result<u64> {
        let _live = LiveGuard::enter(&self.ctx.live_workers);
        let crawler = &self.ctx.config.crawler;
        let sync_every = u64::from(crawler.sync_every.max(1));

        let mut retired: u64 = 0;
        let mut empty_polls: u32 = 0;

        tracing::debug!("Worker {} started", self.id);

        loop {
            if self.cancel.is_cancelled() {
                break;
            }

            let url = match self.ctx.frontier.get_tbd_url()? {
                Dequeue::Ready(url) => {
                    empty_polls = 0;
                    url
                }
                Dequeue::Wait(at) => {
                    empty_polls = 0;
                    let wait = at.saturating_duration_since(Instant::now()).min(MAX_WAIT);
                    if !sleep_or_cancel(&self.cancel, wait).await {
                        break;
                    }
                    continue;
                }
                Dequeue::Exhausted => {
                    if empty_polls >= crawler.empty_queue_retries {
                        tracing::info!(
                            "Worker {} found the frontier empty {} times, stopping",
                            self.id,
                            empty_polls
                        );
                        break;
                    }
                    empty_polls += 1;
                    if !sleep_or_cancel(&self.cancel, crawler.empty_queue_backoff()).await {
                        break;
                    }
                    continue;
                }
            };

            // A URL interrupted mid-flight stays incomplete in the ledger
            // and is queued again on the next resume.
            let outcome = tokio::select! {
                _ = self.cancel.cancelled() => break,
                outcome = self.process_url(&url) => outcome?,
            };

            self.log_outcome(&url, &outcome);
            self.ctx.frontier.mark_url_complete(&url)?;
            retired += 1;

            if retired % sync_every == 0 {
                self.ctx.frontier.sync()?;
            }

            if outcome.made_request() {
                let delay = match domain_key(&url) {
                    Some(domain) => self.ctx.frontier.crawl_delay_for(&domain)?,
                    None => crawler.crawl_delay(),
                };
                if !sleep_or_cancel(&self.cancel, delay).await {
                    break;
                }
            }
        }

        tracing::debug!("Worker {} stopped after {} URLs", self.id, retired);
        Ok(retired)
    }

    /// Takes one URL from robots check to link enqueueing
    ///
    /// Every return value means the URL is finished; only storage and lock
    /// failures are errors.
    async fn process_url(&self, url: &Url) -> Result<UrlOutcome> {
        let ctx = &self.ctx;
        let policy = &ctx.config.fetch;

        let verdict = ctx.robots.check(url).await?;
        if let (Some(delay), Some(domain)) = (verdict.crawl_delay, domain_key(url)) {
            ctx.frontier.set_crawl_delay(&domain, delay)?;
        }
        if !verdict.allowed {
            return Ok(UrlOutcome::Disallowed);
        }

        let (final_url, content_type, body) = match fetch_url(&ctx.client, url, policy).await {
            FetchResult::Success {
                final_url,
                content_type,
                body,
                ..
            } => (final_url, content_type, body),
            FetchResult::HeadRejected { status_code } => {
                return Ok(UrlOutcome::HeadRejected(status_code))
            }
            FetchResult::TooLarge { bytes } => return Ok(UrlOutcome::Oversized(bytes)),
            FetchResult::HttpError { status_code } => {
                return Ok(UrlOutcome::HttpError(status_code))
            }
            FetchResult::NetworkError { error, .. } => return Ok(UrlOutcome::FetchFailed(error)),
        };

        let size = body.len() as u64;
        if size < policy.min_content_length {
            return Ok(UrlOutcome::Undersized(size));
        }
        if !is_html(content_type.as_deref()) {
            return Ok(UrlOutcome::ContentMismatch);
        }

        let page = parse_html(&body, &final_url);
        let words = meaningful_words(&page.text);
        if words.len() < policy.min_words {
            return Ok(UrlOutcome::LowInformation(words.len()));
        }

        match ctx.detector.classify(url.as_str(), &page.text)? {
            Classification::Unique => {}
            Classification::ExactDuplicate => return Ok(UrlOutcome::ExactDuplicate),
            Classification::NearDuplicate { of, similarity } => {
                return Ok(UrlOutcome::NearDuplicate { of, similarity })
            }
        }

        ctx.words.record(url.as_str(), &words)?;

        let mut links_added = 0;
        for link in &page.links {
            if ctx.frontier.add_url(link)? {
                links_added += 1;
            }
        }

        Ok(UrlOutcome::Crawled {
            links_found: page.links.len(),
            links_added,
        })
    }

    fn log_outcome(&self, url: &Url, outcome: &UrlOutcome) {
        if outcome.is_success() {
            tracing::info!("[worker {}] {} {}", self.id, url, outcome);
        } else if outcome.is_error() {
            tracing::warn!("[worker {}] {} {}", self.id, url, outcome);
        } else {
            tracing::debug!("[worker {}] {} {}", self.id, url, outcome);
        }
    }
}
