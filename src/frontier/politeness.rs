//! Politeness-aware ready queue
//!
//! URLs are kept in per-domain FIFOs. Domains with pending URLs live in
//! exactly one of two heaps:
//! - `waiting`: domains still inside their politeness window, keyed by the
//!   instant the window closes
//! - `ready`: eligible domains, keyed by the discovery sequence of their
//!   head URL
//!
//! Popping therefore returns the earliest-discovered URL whose domain is
//! eligible, in O(log D) for D domains.

use crate::state::{DomainState, QueuedUrl, MAX_CRAWL_DELAY};
use crate::url::domain_key;
use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};
use std::time::{Duration, Instant};
use url::Url;

/// Result of asking the frontier for work
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dequeue {
    /// A URL whose domain window has elapsed; the window is now restarted
    Ready(Url),
    /// URLs are queued but none is eligible before this instant
    Wait(Instant),
    /// Nothing is queued
    Exhausted,
}

/// A domain waiting for its politeness window to close
#[derive(Debug, Clone, PartialEq, Eq)]
struct ScheduledDomain {
    ready_at: Instant,
    domain: String,
}

// Reversed so the BinaryHeap pops the earliest instant first
impl Ord for ScheduledDomain {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .ready_at
            .cmp(&self.ready_at)
            .then_with(|| other.domain.cmp(&self.domain))
    }
}

impl PartialOrd for ScheduledDomain {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// An eligible domain, ordered by the discovery sequence of its head URL
#[derive(Debug, Clone, PartialEq, Eq)]
struct ReadyDomain {
    head_seq: u64,
    domain: String,
}

// Reversed so the BinaryHeap pops the lowest sequence first
impl Ord for ReadyDomain {
    fn cmp(&self, other: &Self) -> Ordering {
        other.head_seq.cmp(&self.head_seq)
    }
}

impl PartialOrd for ReadyDomain {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Per-domain FIFOs plus the two scheduling heaps
#[derive(Debug)]
pub struct PolitenessQueue {
    base_delay: Duration,
    domains: HashMap<String, DomainState>,
    waiting: BinaryHeap<ScheduledDomain>,
    ready: BinaryHeap<ReadyDomain>,
    len: usize,
    next_seq: u64,
}

impl PolitenessQueue {
    /// Creates an empty queue enforcing `base_delay` between hand-outs per domain
    pub fn new(base_delay: Duration) -> Self {
        Self {
            base_delay,
            domains: HashMap::new(),
            waiting: BinaryHeap::new(),
            ready: BinaryHeap::new(),
            len: 0,
            next_seq: 0,
        }
    }

    /// Appends a URL behind everything discovered before it
    ///
    /// URLs without a host are dropped.
    pub fn push(&mut self, url: Url) {
        let domain = match domain_key(&url) {
            Some(domain) => domain,
            None => return,
        };

        let seq = self.next_seq;
        self.next_seq += 1;
        self.len += 1;

        let state = self.domains.entry(domain.clone()).or_default();
        let was_idle = state.pending.is_empty();
        state.pending.push_back(QueuedUrl { seq, url });

        if was_idle {
            match state.ready_at(self.base_delay) {
                None => self.ready.push(ReadyDomain {
                    head_seq: seq,
                    domain,
                }),
                Some(ready_at) => self.waiting.push(ScheduledDomain { ready_at, domain }),
            }
        }
    }

    /// Hands out the earliest-discovered eligible URL at `now`
    pub fn pop(&mut self, now: Instant) -> Dequeue {
        self.promote(now);

        while let Some(ReadyDomain { domain, .. }) = self.ready.pop() {
            let base = self.base_delay;
            let state = match self.domains.get_mut(&domain) {
                Some(state) => state,
                None => continue,
            };

            // A robots delay learned after promotion can reopen the window
            if !state.can_request(base, now) {
                if let Some(ready_at) = state.ready_at(base) {
                    self.waiting.push(ScheduledDomain { ready_at, domain });
                }
                continue;
            }

            let queued = match state.pending.pop_front() {
                Some(queued) => queued,
                None => continue,
            };
            state.record_request(now);
            self.len -= 1;

            if !state.pending.is_empty() {
                if let Some(ready_at) = state.ready_at(base) {
                    self.waiting.push(ScheduledDomain { ready_at, domain });
                }
            }

            return Dequeue::Ready(queued.url);
        }

        match self.waiting.peek() {
            Some(next) => Dequeue::Wait(next.ready_at),
            None => Dequeue::Exhausted,
        }
    }

    /// Moves every domain whose window has closed into the ready heap
    fn promote(&mut self, now: Instant) {
        while self
            .waiting
            .peek()
            .map_or(false, |next| next.ready_at <= now)
        {
            let ScheduledDomain { domain, .. } = match self.waiting.pop() {
                Some(scheduled) => scheduled,
                None => break,
            };
            let state = match self.domains.get(&domain) {
                Some(state) => state,
                None => continue,
            };

            match state.ready_at(self.base_delay) {
                Some(ready_at) if ready_at > now => {
                    self.waiting.push(ScheduledDomain { ready_at, domain });
                }
                _ => {
                    if let Some(head) = state.pending.front() {
                        self.ready.push(ReadyDomain {
                            head_seq: head.seq,
                            domain,
                        });
                    }
                }
            }
        }
    }

    /// Records a robots.txt crawl delay for a domain
    ///
    /// Delays above `MAX_CRAWL_DELAY` are clamped.
    pub fn set_crawl_delay(&mut self, domain: &str, delay: Duration) {
        self.domains.entry(domain.to_string()).or_default().crawl_delay =
            Some(delay.min(MAX_CRAWL_DELAY));
    }

    /// Returns the delay currently enforced for a domain
    pub fn delay_for(&self, domain: &str) -> Duration {
        self.domains
            .get(domain)
            .map_or(self.base_delay, |state| state.effective_delay(self.base_delay))
    }

    /// Returns the number of queued URLs
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}
