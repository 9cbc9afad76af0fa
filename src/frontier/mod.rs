//! The crawl frontier
//!
//! The frontier owns every piece of shared crawl bookkeeping:
//! - the durable URL ledger
//! - the politeness-aware ready queue
//! - the subdomain index used for reporting
//! - discovery and completion counters
//!
//! All of it sits behind one mutex. Every public operation holds the lock
//! for its full duration, ledger I/O included, so workers never observe a
//! half-applied update and never receive the same URL twice.

mod politeness;

pub use politeness::{Dequeue, PolitenessQueue};

use crate::config::Config;
use crate::storage::{open_ledger, Ledger};
use crate::url::{normalize_url, url_hash, Scope};
use crate::{Result, SweepError};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};
use url::Url;

/// Point-in-time view of frontier progress
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrontierStatus {
    /// URLs ever added to the ledger
    pub discovered: u64,
    /// URLs waiting in the ready queue
    pub queue_size: usize,
    /// URLs marked complete
    pub completed: u64,
}

struct FrontierInner {
    ledger: Box<dyn Ledger>,
    known: HashSet<String>,
    queue: PolitenessQueue,
    subdomains: BTreeMap<String, BTreeSet<String>>,
    discovered: u64,
    completed: u64,
}

impl FrontierInner {
    fn index_subdomain(&mut self, scope: &Scope, url: &Url) {
        if let Some(host) = url.host_str() {
            if scope.is_assigned_host(host) {
                self.subdomains
                    .entry(host.to_string())
                    .or_default()
                    .insert(url.to_string());
            }
        }
    }

    fn add(&mut self, scope: &Scope, raw_url: &str) -> Result<bool> {
        let url = match normalize_url(raw_url) {
            Ok(url) => url,
            Err(e) => {
                tracing::debug!("Rejected {}: {}", raw_url, e);
                return Ok(false);
            }
        };

        if !scope.is_in_scope(&url) {
            tracing::debug!("Out of scope: {}", url);
            return Ok(false);
        }

        let hash = url_hash(&url);
        if self.known.contains(&hash) {
            return Ok(false);
        }

        let inserted = self.ledger.insert(&hash, url.as_str())?;
        self.known.insert(hash);
        if !inserted {
            return Ok(false);
        }

        self.discovered += 1;
        self.index_subdomain(scope, &url);
        self.queue.push(url);
        Ok(true)
    }

    fn complete(&mut self, scope: &Scope, url: &Url) -> Result<()> {
        let hash = url_hash(url);
        let seen = self.known.contains(&hash);
        if !seen {
            tracing::error!("Completing URL that was never discovered: {}", url);
        }

        let transitioned = self.ledger.mark_completed(&hash, url.as_str())?;
        if !seen {
            self.known.insert(hash);
            if transitioned {
                self.discovered += 1;
                self.index_subdomain(scope, url);
            }
        }
        if transitioned {
            self.completed += 1;
        }
        Ok(())
    }
}

/// Shared, persistent URL frontier
pub struct Frontier {
    inner: Mutex<FrontierInner>,
    scope: Scope,
}

impl Frontier {
    /// Opens the frontier described by the configuration
    ///
    /// When `fresh` is set an existing ledger file is deleted first.
    /// Otherwise the ledger is loaded and the queue rebuilt from its
    /// incomplete records. Seeds are added whenever the ledger is empty.
    ///
    /// # Arguments
    ///
    /// * `config` - The crawler configuration
    /// * `fresh` - Discard any previous crawl state
    pub fn open(config: &Config, fresh: bool) -> Result<Self> {
        let path = Path::new(&config.output.ledger_path);
        if fresh {
            remove_ledger_files(path)?;
        }

        let ledger = open_ledger(path)?;
        let scope = Scope::from_config(&config.scope)?;
        let frontier = Self::with_ledger(Box::new(ledger), scope, config.crawler.crawl_delay())?;

        if frontier.get_status()?.discovered == 0 {
            let added = frontier.seed(&config.crawler.seeds)?;
            tracing::info!("Ledger empty, added {} seed URLs", added);
        }

        Ok(frontier)
    }

    /// Builds a frontier over an already-open ledger
    pub fn with_ledger(ledger: Box<dyn Ledger>, scope: Scope, crawl_delay: Duration) -> Result<Self> {
        let records = ledger.load()?;

        let mut inner = FrontierInner {
            ledger,
            known: HashSet::with_capacity(records.len()),
            queue: PolitenessQueue::new(crawl_delay),
            subdomains: BTreeMap::new(),
            discovered: 0,
            completed: 0,
        };

        let mut dropped = 0usize;
        for record in records {
            inner.known.insert(record.hash);
            inner.discovered += 1;

            let url = match Url::parse(&record.url) {
                Ok(url) => url,
                Err(_) => {
                    dropped += 1;
                    continue;
                }
            };
            inner.index_subdomain(&scope, &url);

            if record.completed {
                inner.completed += 1;
            } else if scope.is_in_scope(&url) {
                inner.queue.push(url);
            } else {
                dropped += 1;
            }
        }

        tracing::info!(
            "Loaded ledger: {} discovered, {} completed, {} queued, {} no longer in scope",
            inner.discovered,
            inner.completed,
            inner.queue.len(),
            dropped
        );

        Ok(Self {
            inner: Mutex::new(inner),
            scope,
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, FrontierInner>> {
        self.inner
            .lock()
            .map_err(|_| SweepError::LockPoisoned("frontier"))
    }

    /// Adds each seed URL, returning how many were new
    pub fn seed(&self, seeds: &[String]) -> Result<usize> {
        let mut inner = self.lock()?;
        let mut added = 0;
        for seed in seeds {
            if inner.add(&self.scope, seed)? {
                added += 1;
            }
        }
        Ok(added)
    }

    /// Records a discovered URL
    ///
    /// The URL is normalized and checked against the scope. A URL whose
    /// hash is already in the ledger is ignored.
    ///
    /// # Returns
    ///
    /// * `Ok(true)` - A new record was created and queued
    /// * `Ok(false)` - The URL was invalid, out of scope, or already known
    /// * `Err(SweepError)` - The ledger write failed
    pub fn add_url(&self, raw_url: &str) -> Result<bool> {
        self.lock()?.add(&self.scope, raw_url)
    }

    /// Takes the next URL whose domain is outside its politeness window
    pub fn get_tbd_url(&self) -> Result<Dequeue> {
        self.get_tbd_url_at(Instant::now())
    }

    pub(crate) fn get_tbd_url_at(&self, now: Instant) -> Result<Dequeue> {
        Ok(self.lock()?.queue.pop(now))
    }

    /// Marks a URL handed out by this frontier as complete
    ///
    /// Completing a URL that was never discovered is logged as an anomaly
    /// and recorded anyway.
    pub fn mark_url_complete(&self, url: &Url) -> Result<()> {
        self.lock()?.complete(&self.scope, url)
    }

    pub fn get_status(&self) -> Result<FrontierStatus> {
        let inner = self.lock()?;
        Ok(FrontierStatus {
            discovered: inner.discovered,
            queue_size: inner.queue.len(),
            completed: inner.completed,
        })
    }

    /// Flushes the ledger to its database file
    pub fn sync(&self) -> Result<()> {
        self.lock()?.ledger.sync()?;
        Ok(())
    }

    /// Applies a robots.txt crawl delay to a domain key (`host[:port]`)
    pub fn set_crawl_delay(&self, domain: &str, delay: Duration) -> Result<()> {
        self.lock()?.queue.set_crawl_delay(domain, delay);
        Ok(())
    }

    /// Returns the politeness delay currently enforced for a domain key
    pub fn crawl_delay_for(&self, domain: &str) -> Result<Duration> {
        Ok(self.lock()?.queue.delay_for(domain))
    }

    /// Number of discovered URLs per assigned subdomain
    pub fn subdomain_counts(&self) -> Result<BTreeMap<String, usize>> {
        let inner = self.lock()?;
        Ok(inner
            .subdomains
            .iter()
            .map(|(host, urls)| (host.clone(), urls.len()))
            .collect())
    }

    /// Number of distinct URLs in the ledger
    pub fn unique_urls(&self) -> Result<usize> {
        Ok(self.lock()?.known.len())
    }

    pub fn scope(&self) -> &Scope {
        &self.scope
    }
}

/// Deletes a ledger database along with its WAL side files
fn remove_ledger_files(path: &Path) -> Result<()> {
    let mut wal = path.as_os_str().to_owned();
    wal.push("-wal");
    let mut shm = path.as_os_str().to_owned();
    shm.push("-shm");

    for file in [path.to_path_buf(), wal.into(), shm.into()] {
        if file.exists() {
            tracing::info!("Removing previous crawl state at {}", file.display());
            std::fs::remove_file(&file)?;
        }
    }
    Ok(())
}
