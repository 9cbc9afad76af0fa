//! Crawler coordinator - main crawl orchestration logic
//!
//! This module wires the shared crawl state together and supervises a run:
//! - Opening (or discarding) the ledger and snapshots
//! - Spawning the worker pool and the status sampler
//! - Joining everything on exhaustion or cancellation
//! - Writing the final snapshots and report

use crate::config::Config;
use crate::crawler::fetcher::build_http_client;
use crate::crawler::sampler::{log_status, persist, run_sampler};
use crate::crawler::worker::{CrawlContext, Worker};
use crate::dedup::DuplicateDetector;
use crate::frontier::{Frontier, FrontierStatus};
use crate::output::WordTracker;
use crate::robots::RobotsCache;
use crate::Result;
use std::path::Path;
use std::sync::atomic::AtomicUsize;
use std::sync::Arc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

/// What a finished run did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    /// URLs retired during this run
    pub retired: u64,

    /// Workers that stopped on a storage or lock error
    pub failed_workers: usize,

    /// Whether the run was stopped by cancellation rather than exhaustion
    pub interrupted: bool,

    /// Frontier counters after the final flush
    pub status: FrontierStatus,
}

/// Main crawler structure
pub struct Crawler {
    ctx: Arc<CrawlContext>,
}

impl Crawler {
    /// Creates a crawler, resuming persisted state unless `fresh`
    ///
    /// # Arguments
    ///
    /// * `config` - The validated crawler configuration
    /// * `fresh` - Discard the ledger and all snapshots before starting
    ///
    /// # Returns
    ///
    /// * `Ok(Crawler)` - Ready to run
    /// * `Err(SweepError)` - State could not be opened or the HTTP client failed to build
    pub fn new(config: Config, fresh: bool) -> Result<Self> {
        let dedup_path = Path::new(&config.output.dedup_path);
        let stats_path = Path::new(&config.output.stats_path);

        if fresh {
            remove_snapshot(dedup_path)?;
            remove_snapshot(stats_path)?;
        }

        let frontier = Frontier::open(&config, fresh)?;
        let detector = DuplicateDetector::load(dedup_path, config.dedup.near_duplicate_threshold)?;
        let words = WordTracker::load(stats_path)?;

        let client = build_http_client(&config.user_agent, &config.fetch)?;
        let robots = RobotsCache::new(client.clone(), &config.user_agent.crawler_name);

        let status = frontier.get_status()?;
        let dedup = detector.stats()?;
        tracing::info!(
            "Crawl state ready: {} discovered, {} completed, {} queued, {} pages indexed for duplicates",
            status.discovered,
            status.completed,
            status.queue_size,
            dedup.indexed_pages
        );

        Ok(Self {
            ctx: Arc::new(CrawlContext {
                config,
                frontier,
                detector,
                words,
                robots,
                client,
                live_workers: AtomicUsize::new(0),
            }),
        })
    }

    /// Shared crawl state
    pub fn context(&self) -> &Arc<CrawlContext> {
        &self.ctx
    }

    /// Runs the worker pool until the frontier is exhausted or `cancel` fires
    ///
    /// The sampler runs alongside the workers on a child token and is
    /// stopped once every worker has been joined. All state is flushed
    /// before returning, including after cancellation.
    pub async fn run(&self, cancel: CancellationToken) -> Result<RunSummary> {
        let workers = self.ctx.config.crawler.workers as usize;
        tracing::info!("Starting crawl with {} workers", workers);

        let sampler_cancel = cancel.child_token();
        let sampler = tokio::spawn(run_sampler(self.ctx.clone(), sampler_cancel.clone()));

        let mut tasks = JoinSet::new();
        for id in 1..=workers {
            let worker = Worker::new(id, self.ctx.clone(), cancel.clone());
            tasks.spawn(worker.run());
        }

        let mut retired = 0;
        let mut failed_workers = 0;
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(Ok(count)) => retired += count,
                Ok(Err(e)) => {
                    failed_workers += 1;
                    tracing::error!("Worker aborted: {}", e);
                }
                Err(e) => {
                    failed_workers += 1;
                    tracing::error!("A worker task panicked or was cancelled: {}", e);
                }
            }
        }

        sampler_cancel.cancel();
        sampler.await?;

        let interrupted = cancel.is_cancelled();
        if interrupted {
            tracing::info!("Crawl interrupted, saving state");
        } else {
            tracing::info!("Frontier exhausted, saving state");
        }

        log_status(&self.ctx)?;
        persist(&self.ctx)?;

        let status = self.ctx.frontier.get_status()?;
        tracing::info!(
            "Crawl finished: {} URLs retired this run, {} discovered, {} completed",
            retired,
            status.discovered,
            status.completed
        );

        Ok(RunSummary {
            retired,
            failed_workers,
            interrupted,
            status,
        })
    }
}

fn remove_snapshot(path: &Path) -> Result<()> {
    if path.exists() {
        tracing::info!("Removing previous crawl state at {}", path.display());
        std::fs::remove_file(path)?;
    }
    Ok(())
}

/// Runs a complete crawl
///
/// # Arguments
///
/// * `config` - The crawler configuration
/// * `fresh` - Start over instead of resuming
/// * `cancel` - Cancelled to stop the crawl early; state is still saved
///
/// # Example
///
/// ```no_run
/// use sumi_sweep::config::load_config;
/// use sumi_sweep::crawler::run_crawl;
/// use std::path::Path;
/// use tokio_util::sync::CancellationToken;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = load_config(Path::new("config.toml"))?;
/// run_crawl(config, false, CancellationToken::new()).await?;
/// # Ok(())
/// # }
/// ```
pub async fn run_crawl(config: Config, fresh: bool, cancel: CancellationToken) -> Result<RunSummary> {
    let crawler = Crawler::new(config, fresh)?;
    crawler.run(cancel).await
}
