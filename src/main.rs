//! Sumi-Sweep main entry point
//!
//! This is the command-line interface for the Sumi-Sweep crawler.

use anyhow::Context;
use clap::Parser;
use std::path::{Path, PathBuf};
use sumi_sweep::config::{load_config_with_hash, Config};
use sumi_sweep::crawler::run_crawl;
use sumi_sweep::dedup::DuplicateDetector;
use sumi_sweep::frontier::Frontier;
use sumi_sweep::output::{load_statistics, print_statistics, write_report, WordTracker};
use sumi_sweep::storage::open_ledger;
use sumi_sweep::url::Scope;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// Sumi-Sweep: A polite, resumable domain crawler
///
/// Sumi-Sweep crawls an assigned set of domains while respecting robots.txt
/// and per-host crawl delays. It skips duplicate and near-duplicate pages,
/// and can be stopped and resumed at any time.
#[derive(Parser, Debug)]
#[command(name = "sumi-sweep")]
#[command(version = "1.0.0")]
#[command(about = "A polite, resumable domain crawler", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Resume from the saved ledger (default behavior)
    #[arg(long, conflicts_with = "fresh")]
    resume: bool,

    /// Start a fresh crawl, deleting the ledger and snapshots
    #[arg(long, conflicts_with = "resume")]
    fresh: bool,

    /// Validate config and show what would be crawled without actually crawling
    #[arg(long, conflicts_with_all = ["stats", "report"])]
    dry_run: bool,

    /// Show statistics from the ledger and exit
    #[arg(long, conflicts_with_all = ["dry_run", "report"])]
    stats: bool,

    /// Write the report file from saved state and exit
    #[arg(long, conflicts_with_all = ["dry_run", "stats"])]
    report: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("failed to load {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    if cli.dry_run {
        handle_dry_run(&config);
    } else if cli.stats {
        handle_stats(&config)?;
    } else if cli.report {
        handle_report(&config)?;
    } else {
        handle_crawl(config, cli.fresh).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("sumi_sweep=info,warn"),
            1 => EnvFilter::new("sumi_sweep=debug,info"),
            2 => EnvFilter::new("sumi_sweep=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --dry-run mode: shows the resolved configuration
fn handle_dry_run(config: &Config) {
    println!("=== Sumi-Sweep Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  Workers: {}", config.crawler.workers);
    println!("  Crawl delay: {}ms", config.crawler.crawl_delay);
    println!("  Sync every: {} URLs", config.crawler.sync_every);
    println!(
        "  Empty queue: {} retries, {}ms apart",
        config.crawler.empty_queue_retries, config.crawler.empty_queue_backoff
    );

    println!("\nUser Agent:");
    println!("  {}", config.user_agent.header_value());

    println!("\nFetch Policy:");
    println!(
        "  Timeouts: connect {}ms, read {}ms",
        config.fetch.connect_timeout, config.fetch.read_timeout
    );
    println!("  HEAD pre-check: {}", config.fetch.head_check);
    println!(
        "  Content length: {} to {} bytes",
        config.fetch.min_content_length, config.fetch.max_content_length
    );
    println!("  Minimum words: {}", config.fetch.min_words);
    println!(
        "  Near-duplicate threshold: {}",
        config.dedup.near_duplicate_threshold
    );

    println!("\nScope:");
    for domain in &config.scope.domains {
        println!("  - {}", domain);
    }
    for restriction in &config.scope.path_restricted {
        println!("  - {}{} (path restricted)", restriction.host, restriction.path_prefix);
    }

    println!("\nOutput:");
    println!("  Ledger: {}", config.output.ledger_path);
    println!("  Duplicate store: {}", config.output.dedup_path);
    println!("  Word statistics: {}", config.output.stats_path);
    println!("  Report: {}", config.output.report_path);

    println!("\nSeeds ({}):", config.crawler.seeds.len());
    for seed in &config.crawler.seeds {
        println!("  * {}", seed);
    }

    println!("\n✓ Configuration is valid");
}

/// Handles the --stats mode: shows statistics from the ledger
fn handle_stats(config: &Config) -> anyhow::Result<()> {
    println!("Ledger: {}\n", config.output.ledger_path);

    let ledger = open_ledger(Path::new(&config.output.ledger_path))?;
    let scope = Scope::from_config(&config.scope)?;
    let mut stats = load_statistics(&ledger, &scope)?;

    let dedup_path = Path::new(&config.output.dedup_path);
    if dedup_path.exists() {
        let detector =
            DuplicateDetector::load(dedup_path, config.dedup.near_duplicate_threshold)?;
        stats.dedup = Some(detector.stats()?);
    }

    print_statistics(&stats);
    Ok(())
}

/// Handles the --report mode: rewrites the report from saved state
fn handle_report(config: &Config) -> anyhow::Result<()> {
    let ledger = open_ledger(Path::new(&config.output.ledger_path))?;
    let scope = Scope::from_config(&config.scope)?;
    let frontier = Frontier::with_ledger(Box::new(ledger), scope, config.crawler.crawl_delay())?;
    let words = WordTracker::load(Path::new(&config.output.stats_path))?;

    write_report(&frontier, &words, Path::new(&config.output.report_path))?;
    println!("✓ Report written to: {}", config.output.report_path);
    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(config: Config, fresh: bool) -> anyhow::Result<()> {
    if fresh {
        tracing::info!("Starting fresh crawl (ignoring previous state)");
    } else {
        tracing::info!("Starting crawl (resuming saved state if present)");
    }

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Interrupt received, finishing in-flight work");
            on_signal.cancel();
        }
    });

    let summary = run_crawl(config, fresh, cancel)
        .await
        .context("crawl failed")?;

    if summary.failed_workers > 0 {
        tracing::warn!("{} workers stopped on errors", summary.failed_workers);
    }
    if summary.interrupted {
        tracing::info!("Crawl stopped early; run again to resume");
    } else {
        tracing::info!("Crawl completed successfully");
    }

    Ok(())
}
