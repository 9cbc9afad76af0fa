//! Periodic status logging and persistence
//!
//! The sampler wakes every `status-interval`, logs frontier progress, and
//! writes every snapshot (ledger checkpoint, duplicate store, word
//! statistics, report). It takes each lock only for as long as one
//! snapshot needs.

use crate::crawler::worker::CrawlContext;
use crate::output::write_report;
use crate::Result;
use std::path::Path;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Logs one status line
pub fn log_status(ctx: &CrawlContext) -> Result<()> {
    let status = ctx.frontier.get_status()?;
    let dedup = ctx.detector.stats()?;

    tracing::info!(
        "Status: {} discovered, {} completed, {} queued, {} workers active, {} pages indexed, {} robots cached",
        status.discovered,
        status.completed,
        status.queue_size,
        ctx.live_workers.load(Ordering::SeqCst),
        dedup.indexed_pages,
        ctx.robots.len()
    );
    Ok(())
}

/// Writes every piece of persistent crawl state
pub fn persist(ctx: &CrawlContext) -> Result<()> {
    ctx.frontier.sync()?;
    ctx.detector.save()?;
    ctx.words.save()?;
    write_report(
        &ctx.frontier,
        &ctx.words,
        Path::new(&ctx.config.output.report_path),
    )?;
    Ok(())
}

/// Runs until cancelled, logging and persisting on every tick
///
/// Failures are logged and the next tick tries again.
pub async fn run_sampler(ctx: Arc<CrawlContext>, cancel: CancellationToken) {
    let mut interval = tokio::time::interval(ctx.config.output.status_interval());
    // The first tick completes immediately
    interval.tick().await;

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = interval.tick() => {}
        }

        if let Err(e) = log_status(&ctx) {
            tracing::error!("Failed to read crawl status: {}", e);
        }
        if let Err(e) = persist(&ctx) {
            tracing::error!("Failed to persist crawl state: {}", e);
        }
    }

    tracing::debug!("Sampler stopped");
}
