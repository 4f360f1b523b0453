//! Frontier: the shared work queue and its deduplication state
//!
//! Every URL the crawl knows about is in at most one of three places: the
//! FIFO queue (and the `queued` membership set), the in-flight set of URLs a
//! worker currently holds, or the `scraped` set. All transitions between
//! them happen under one mutex, together with the matching append to the
//! durable queue or ledger file, so the files never disagree with memory
//! about a URL's state for longer than one call.
//!
//! Workers wait for work on a [`Notify`]; the lock is never held across an
//! `.await`.

use crate::storage::{MembershipIndex, StorageResult, UrlJournal};
use crate::url::normalize_str;
use std::collections::{HashSet, VecDeque};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::Notify;
use tokio::time::{timeout_at, Instant};

/// Result of waiting for work
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dequeued {
    /// A URL to process; it is now in flight
    Url(String),

    /// Nothing arrived before the timeout, but other workers may still
    /// discover links
    Idle,

    /// The queue is empty and nothing is in flight: the crawl is complete
    Drained,
}

/// Point-in-time sizes of the frontier's sets
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrontierCounts {
    pub queued: usize,
    pub in_flight: usize,
    pub scraped: u64,
}

/// What recovery found on disk
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecoveryReport {
    pub scraped_loaded: u64,
    pub queue_loaded: usize,
    pub seeded: usize,
    pub discarded: usize,
}

impl RecoveryReport {
    /// True if any prior progress was found
    pub fn resumed(&self) -> bool {
        self.scraped_loaded > 0 || self.queue_loaded > 0
    }
}

struct FrontierInner {
    queue: VecDeque<String>,
    in_flight: HashSet<String>,
    index: Box<dyn MembershipIndex>,
    journal: Option<UrlJournal>,
}

impl FrontierInner {
    /// Pushes a normalized URL unless it is already known; returns true if added
    fn admit(&mut self, url: &str) -> StorageResult<bool> {
        if self.in_flight.contains(url) || self.index.is_scraped(url)? {
            return Ok(false);
        }
        if !self.index.mark_queued(url)? {
            return Ok(false);
        }
        self.queue.push_back(url.to_string());
        Ok(true)
    }

    fn is_drained(&self) -> bool {
        self.queue.is_empty() && self.in_flight.is_empty()
    }

    fn pop(&mut self) -> StorageResult<Option<String>> {
        let Some(url) = self.queue.pop_front() else {
            return Ok(None);
        };
        self.index.unmark_queued(&url)?;
        self.in_flight.insert(url.clone());
        Ok(Some(url))
    }

    fn remaining(&self) -> Vec<String> {
        let mut urls: Vec<String> = self
            .queue
            .iter()
            .chain(self.in_flight.iter())
            .cloned()
            .collect();
        urls.sort();
        urls.dedup();
        urls
    }
}

/// Concurrent work queue with deduplication
pub struct Frontier {
    inner: Mutex<FrontierInner>,
    notify: Notify,
}

impl Frontier {
    /// Creates an empty frontier with no durable files (for testing and dry runs)
    pub fn in_memory(index: Box<dyn MembershipIndex>) -> Self {
        Self {
            inner: Mutex::new(FrontierInner {
                queue: VecDeque::new(),
                in_flight: HashSet::new(),
                index,
                journal: None,
            }),
            notify: Notify::new(),
        }
    }

    /// Rebuilds the frontier from the ledger and queue files
    ///
    /// Every loaded URL goes through the same normalization as discovered
    /// links. Queue entries that are malformed, duplicated or already
    /// scraped are discarded. If both files are empty (or `fresh` is set)
    /// the frontier is seeded instead. The files are then rewritten so they
    /// match the recovered state exactly.
    pub fn recover(
        mut index: Box<dyn MembershipIndex>,
        journal: Option<UrlJournal>,
        seeds: &[String],
        fresh: bool,
    ) -> StorageResult<(Self, RecoveryReport)> {
        let mut report = RecoveryReport::default();

        // The ledger and queue files are authoritative; a persistent index
        // is rebuilt from them on every start
        index.clear()?;

        let (scraped, queued) = match (&journal, fresh) {
            (Some(journal), false) => (journal.load_scraped()?, journal.load_queue()?),
            _ => (Vec::new(), Vec::new()),
        };

        for url in &scraped {
            match normalize_str(url) {
                Ok(normalized) => {
                    index.mark_scraped(&normalized)?;
                }
                Err(e) => {
                    tracing::warn!("Discarding unparsable ledger entry {}: {}", url, e);
                }
            }
        }
        report.scraped_loaded = index.scraped_count()?;

        let frontier = Self {
            inner: Mutex::new(FrontierInner {
                queue: VecDeque::new(),
                in_flight: HashSet::new(),
                index,
                journal,
            }),
            notify: Notify::new(),
        };

        {
            let mut inner = frontier.lock();
            for url in &queued {
                let admitted = match normalize_str(url) {
                    Ok(normalized) => inner.admit(&normalized)?,
                    Err(_) => false,
                };
                if admitted {
                    report.queue_loaded += 1;
                } else {
                    report.discarded += 1;
                }
            }

            if report.scraped_loaded == 0 && report.queue_loaded == 0 {
                for seed in seeds {
                    match normalize_str(seed) {
                        Ok(normalized) => {
                            if inner.admit(&normalized)? {
                                report.seeded += 1;
                            }
                        }
                        Err(e) => tracing::warn!("Skipping invalid seed {}: {}", seed, e),
                    }
                }
            }
        }

        frontier.flush()?;

        tracing::info!(
            "Recovered frontier: {} scraped, {} queued, {} seeded, {} discarded",
            report.scraped_loaded,
            report.queue_loaded,
            report.seeded,
            report.discarded
        );

        Ok((frontier, report))
    }

    fn lock(&self) -> MutexGuard<'_, FrontierInner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Enqueues one URL; returns true if it was new
    pub fn enqueue(&self, url: &str) -> StorageResult<bool> {
        Ok(self.enqueue_batch(std::iter::once(url))? == 1)
    }

    /// Enqueues a batch of URLs; returns how many were new
    ///
    /// URLs are normalized first; unparsable ones are skipped. New URLs are
    /// appended to the durable queue file before the lock is released.
    pub fn enqueue_batch<I, S>(&self, urls: I) -> StorageResult<usize>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let normalized: Vec<String> = urls
            .into_iter()
            .filter_map(|url| normalize_str(url.as_ref()).ok())
            .collect();

        let added = {
            let mut inner = self.lock();
            let mut added = Vec::new();
            for url in normalized {
                if inner.admit(&url)? {
                    added.push(url);
                }
            }
            if let Some(journal) = &inner.journal {
                journal.append_queued(&added)?;
            }
            added.len()
        };

        if added > 0 {
            self.notify.notify_waiters();
        }
        Ok(added)
    }

    /// Waits up to `timeout` for a URL to process
    ///
    /// A returned URL is in flight until [`Frontier::finish`] is called
    /// for it.
    pub async fn dequeue(&self, timeout: Duration) -> StorageResult<Dequeued> {
        let deadline = Instant::now() + timeout;

        loop {
            let notified = self.notify.notified();
            tokio::pin!(notified);
            // Register before checking so a wakeup between the check and the
            // await is not lost
            notified.as_mut().enable();

            {
                let mut inner = self.lock();
                if let Some(url) = inner.pop()? {
                    return Ok(Dequeued::Url(url));
                }
                if inner.is_drained() {
                    return Ok(Dequeued::Drained);
                }
            }

            if timeout_at(deadline, notified.as_mut()).await.is_err() {
                let mut inner = self.lock();
                if let Some(url) = inner.pop()? {
                    return Ok(Dequeued::Url(url));
                }
                return Ok(if inner.is_drained() {
                    Dequeued::Drained
                } else {
                    Dequeued::Idle
                });
            }
        }
    }

    /// Stores a page for `url` unless it has been stored already
    ///
    /// Under the frontier lock: if `url` is scraped, returns `None` without
    /// calling `write`; otherwise runs `write`, marks the URL scraped and
    /// appends it to the ledger. A failed write leaves the URL unscraped.
    pub fn commit<T, F>(&self, url: &str, write: F) -> StorageResult<Option<T>>
    where
        F: FnOnce() -> StorageResult<T>,
    {
        let mut inner = self.lock();
        if inner.index.is_scraped(url)? {
            return Ok(None);
        }

        let stored = write()?;
        inner.index.mark_scraped(url)?;
        if let Some(journal) = &inner.journal {
            journal.append_scraped(url)?;
        }
        Ok(Some(stored))
    }

    /// Ends the in-flight state of a URL, whatever the outcome
    pub fn finish(&self, url: &str) {
        let drained = {
            let mut inner = self.lock();
            inner.in_flight.remove(url);
            inner.is_drained()
        };
        if drained {
            self.notify.notify_waiters();
        }
    }

    /// Returns true if the URL has been stored
    pub fn is_scraped(&self, url: &str) -> StorageResult<bool> {
        self.lock().index.is_scraped(url)
    }

    /// Queued and in-flight URLs, sorted
    pub fn snapshot_remaining(&self) -> Vec<String> {
        self.lock().remaining()
    }

    pub fn counts(&self) -> StorageResult<FrontierCounts> {
        let inner = self.lock();
        Ok(FrontierCounts {
            queued: inner.queue.len(),
            in_flight: inner.in_flight.len(),
            scraped: inner.index.scraped_count()?,
        })
    }

    /// Rewrites the ledger and queue files from memory
    ///
    /// In-flight URLs are written to the queue file: they are still pending
    /// until committed. Holding the lock keeps appends from interleaving
    /// with the rewrite. Returns `(scraped, pending)` counts.
    pub fn flush(&self) -> StorageResult<(u64, usize)> {
        let inner = self.lock();
        let remaining = inner.remaining();
        let scraped = inner.index.scraped_urls()?;
        if let Some(journal) = &inner.journal {
            journal.rewrite(&scraped, &remaining)?;
        }
        Ok((scraped.len() as u64, remaining.len()))
    }
}
