//! Fetch-parse-discover worker
//!
//! One iteration takes a URL from the frontier, fetches it, stores the page
//! text through the frontier's compare-and-set commit, filters the page's
//! links and enqueues the new ones. Every per-URL failure is logged, counted
//! and swallowed; nothing short of shutdown or a drained frontier ends the
//! loop.

use crate::config::CrawlerConfig;
use crate::crawler::fetcher::{fetch_url, FailureKind, FetchResult};
use crate::crawler::frontier::{Dequeued, Frontier};
use crate::crawler::parser::parse_html;
use crate::output::CrawlStats;
use crate::storage::{CheckpointManager, PageStore};
use crate::url::UrlFilter;
use reqwest::Client;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use url::Url;

/// Timing knobs for the worker loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerSettings {
    pub dequeue_timeout: Duration,
    pub politeness_delay: Duration,
    pub milestone_interval: u64,
}

impl WorkerSettings {
    pub fn from_config(config: &CrawlerConfig) -> Self {
        Self {
            dequeue_timeout: Duration::from_millis(config.dequeue_timeout),
            politeness_delay: Duration::from_millis(config.politeness_delay),
            milestone_interval: config.milestone_interval.max(1),
        }
    }
}

/// Everything a worker shares with the rest of the pool
pub struct WorkerContext {
    pub frontier: Arc<Frontier>,
    pub pages: Arc<PageStore>,
    pub checkpoints: Arc<CheckpointManager>,
    pub filter: Arc<UrlFilter>,
    pub client: Client,
    pub stats: Arc<CrawlStats>,
    pub active: Arc<AtomicUsize>,
    pub settings: WorkerSettings,
}

/// What one iteration did with its URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IterationOutcome {
    /// Page written with this sequence index; `new_links` were enqueued
    Stored { index: u64, new_links: usize },

    /// Another worker stored this URL first
    Duplicate,

    /// Response was not HTML
    SkippedNonHtml,

    /// Fetch or store failed
    Failed(FailureKind),
}

/// One member of the worker pool
pub struct Worker {
    id: usize,
    ctx: Arc<WorkerContext>,
}

impl Worker {
    pub fn new(id: usize, ctx: Arc<WorkerContext>) -> Self {
        Self { id, ctx }
    }

    /// Runs until the frontier drains or shutdown is signalled
    ///
    /// Shutdown is only observed between iterations: a URL that has been
    /// dequeued is always carried through to a stored page or a failure.
    /// Returns the number of URLs this worker processed.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) -> u64 {
        let mut processed = 0u64;
        tracing::debug!("Worker {} started", self.id);

        loop {
            if *shutdown.borrow() {
                break;
            }

            let next = tokio::select! {
                biased;
                _ = shutdown.changed() => break,
                next = self.ctx.frontier.dequeue(self.ctx.settings.dequeue_timeout) => next,
            };

            let url = match next {
                Ok(Dequeued::Url(url)) => url,
                Ok(Dequeued::Idle) => continue,
                Ok(Dequeued::Drained) => {
                    tracing::debug!("Worker {} found the frontier drained", self.id);
                    break;
                }
                Err(e) => {
                    tracing::error!("Worker {} could not dequeue: {}", self.id, e);
                    break;
                }
            };

            self.ctx.active.fetch_add(1, Ordering::SeqCst);
            let outcome = self.process(&url).await;
            self.ctx.frontier.finish(&url);
            self.ctx.active.fetch_sub(1, Ordering::SeqCst);
            processed += 1;

            tracing::trace!("Worker {} finished {}: {:?}", self.id, url, outcome);

            // Politeness delay, cut short by shutdown
            tokio::select! {
                biased;
                _ = shutdown.changed() => {}
                _ = tokio::time::sleep(self.ctx.settings.politeness_delay) => {}
            }
        }

        tracing::debug!("Worker {} stopped after {} URLs", self.id, processed);
        processed
    }

    /// Runs one fetch-parse-store-discover iteration for a dequeued URL
    pub async fn process(&self, url: &str) -> IterationOutcome {
        let ctx = &self.ctx;

        match ctx.frontier.is_scraped(url) {
            Ok(true) => {
                ctx.stats.record_duplicate();
                return IterationOutcome::Duplicate;
            }
            Ok(false) => {}
            Err(e) => return self.storage_failure(url, &e),
        }

        let (final_url, body) = match fetch_url(&ctx.client, url).await {
            FetchResult::Success {
                final_url, body, ..
            } => (final_url, body),
            FetchResult::NotHtml { content_type } => {
                tracing::info!(
                    "[W{}] Skipping non-HTML content ({}): {}",
                    self.id,
                    if content_type.is_empty() {
                        "no content-type"
                    } else {
                        content_type.as_str()
                    },
                    url
                );
                ctx.stats.record_non_html();
                return IterationOutcome::SkippedNonHtml;
            }
            FetchResult::HttpError { status_code, kind } => {
                tracing::warn!("[W{}] Failed: {} ({}) {}", self.id, status_code, kind, url);
                ctx.stats.record_failure(kind);
                return IterationOutcome::Failed(kind);
            }
            FetchResult::NetworkError { error, kind } => {
                tracing::warn!("[W{}] Failed: {} ({}) {}", self.id, kind, error, url);
                ctx.stats.record_failure(kind);
                return IterationOutcome::Failed(kind);
            }
        };

        let base = match Url::parse(&final_url).or_else(|_| Url::parse(url)) {
            Ok(base) => base,
            Err(e) => {
                tracing::warn!("[W{}] Unusable response URL {}: {}", self.id, final_url, e);
                ctx.stats.record_failure(FailureKind::Body);
                return IterationOutcome::Failed(FailureKind::Body);
            }
        };
        let parsed = parse_html(&body, &base);

        let record = match ctx
            .frontier
            .commit(url, || ctx.pages.write(url, &parsed.text))
        {
            Ok(Some(record)) => record,
            Ok(None) => {
                ctx.stats.record_duplicate();
                return IterationOutcome::Duplicate;
            }
            Err(e) => return self.storage_failure(url, &e),
        };
        ctx.stats.record_stored();

        let discovered = parsed.links.len();
        let accepted: Vec<String> = parsed
            .links
            .into_iter()
            .filter(|link| {
                let verdict = ctx.filter.evaluate(link);
                tracing::trace!("{} -> {:?}", link, verdict);
                verdict.is_accepted()
            })
            .collect();

        let new_links = match ctx.frontier.enqueue_batch(&accepted) {
            Ok(added) => added,
            Err(e) => {
                tracing::error!("[W{}] Could not enqueue links from {}: {}", self.id, url, e);
                0
            }
        };
        ctx.stats.record_links(discovered, new_links);

        tracing::info!(
            "[W{}] #{} +{} links {}",
            self.id,
            record.sequence_index,
            new_links,
            url
        );

        if record.sequence_index % ctx.settings.milestone_interval == 0 {
            match ctx.checkpoints.flush("milestone") {
                Ok(()) => tracing::info!(
                    "Milestone [{}] - Queue: {}",
                    record.sequence_index,
                    ctx.frontier.counts().map(|c| c.queued).unwrap_or(0)
                ),
                Err(e) => tracing::error!("Milestone flush failed: {}", e),
            }
        }

        IterationOutcome::Stored {
            index: record.sequence_index,
            new_links,
        }
    }

    fn storage_failure(&self, url: &str, error: &crate::storage::StorageError) -> IterationOutcome {
        tracing::error!("[W{}] Storage error for {}: {}", self.id, url, error);
        self.ctx.stats.record_failure(FailureKind::Storage);
        IterationOutcome::Failed(FailureKind::Storage)
    }
}
