//! Crawl supervisor - lifecycle orchestration
//!
//! The supervisor owns one crawl from start to finish:
//! - Recovering the frontier and opening the page store
//! - Spawning the worker pool
//! - Running the status and checkpoint timers
//! - Reacting to cancellation with an immediate flush
//! - Writing the final flush and checkpoint

use crate::config::Config;
use crate::crawler::fetcher::build_http_client;
use crate::crawler::frontier::{Frontier, RecoveryReport};
use crate::crawler::worker::{Worker, WorkerContext, WorkerSettings};
use crate::output::{CrawlStats, StatsSnapshot};
use crate::state::CrawlPhase;
use crate::storage::{open_index, open_journal, CheckpointManager, PageStore};
use crate::url::UrlFilter;
use crate::CrawlError;
use std::future::Future;
use std::sync::atomic::AtomicUsize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinSet;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

/// How a crawl ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrawlStatus {
    /// The frontier drained
    Completed,

    /// Cancellation was requested before the frontier drained
    Interrupted,
}

impl CrawlStatus {
    /// Process exit code conventionally associated with this status
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Completed => 0,
            Self::Interrupted => 130,
        }
    }
}

/// Summary returned by [`Supervisor::run`]
#[derive(Debug, Clone)]
pub struct CrawlReport {
    pub status: CrawlStatus,

    /// Ledger size at the end of the run
    pub scraped_total: u64,

    /// Queued and in-flight URLs left for the next run
    pub remaining: usize,

    /// Next page index the store would assign
    pub next_index: u64,

    /// What was found on disk at startup
    pub recovery: RecoveryReport,

    /// Counters for this run only
    pub stats: StatsSnapshot,
}

/// Drives one crawl through its lifecycle phases
pub struct Supervisor {
    config: Config,
    config_hash: String,
    fresh: bool,
    phase: CrawlPhase,
}

impl Supervisor {
    /// Creates a supervisor for a validated configuration
    ///
    /// # Arguments
    ///
    /// * `config` - The crawler configuration
    /// * `config_hash` - Hash of the configuration file, recorded in checkpoints
    /// * `fresh` - Ignore the prior ledger and queue files
    pub fn new(config: Config, config_hash: impl Into<String>, fresh: bool) -> Self {
        Self {
            config,
            config_hash: config_hash.into(),
            fresh,
            phase: CrawlPhase::Idle,
        }
    }

    pub fn phase(&self) -> CrawlPhase {
        self.phase
    }

    fn transition(
        &mut self,
        next: CrawlPhase,
        checkpoints: Option<&CheckpointManager>,
    ) -> Result<(), CrawlError> {
        if !self.phase.can_transition_to(next) {
            return Err(CrawlError::InvalidTransition {
                from: self.phase,
                to: next,
            });
        }
        tracing::debug!("Crawl phase: {} -> {}", self.phase, next);
        self.phase = next;
        if let Some(checkpoints) = checkpoints {
            checkpoints.set_phase(next);
        }
        Ok(())
    }

    /// Runs the crawl until it drains or Ctrl+C is pressed
    pub async fn run(self) -> Result<CrawlReport, CrawlError> {
        self.run_until(async {
            match tokio::signal::ctrl_c().await {
                Ok(()) => tracing::warn!("Interrupted by user, saving current state..."),
                Err(e) => {
                    tracing::error!("Could not listen for Ctrl+C: {}", e);
                    std::future::pending::<()>().await;
                }
            }
        })
        .await
    }

    /// Runs the crawl until it drains or `shutdown` completes
    ///
    /// On shutdown the workers are told to stop, state is flushed at once,
    /// and each worker is allowed to finish the URL it holds.
    pub async fn run_until<F>(mut self, shutdown: F) -> Result<CrawlReport, CrawlError>
    where
        F: Future<Output = ()>,
    {
        self.transition(CrawlPhase::Seeding, None)?;

        let output = &self.config.output;
        let index = open_index(output)?;
        let (frontier, recovery) = Frontier::recover(
            index,
            Some(open_journal(output)),
            &self.config.scope.seeds,
            self.fresh,
        )?;
        let frontier = Arc::new(frontier);

        let pages = Arc::new(PageStore::open(
            &output.pages_dir,
            &output.page_extension,
            output.index_width,
            recovery.scraped_loaded,
        )?);

        let active = Arc::new(AtomicUsize::new(0));
        let checkpoints = Arc::new(CheckpointManager::new(
            Arc::clone(&frontier),
            Arc::clone(&pages),
            &output.checkpoint_file,
            Arc::clone(&active),
            self.config_hash.clone(),
        ));
        checkpoints.set_phase(self.phase);

        let crawler = &self.config.crawler;
        let client = build_http_client(
            &self.config.user_agent,
            Duration::from_millis(crawler.request_timeout),
        )?;
        let stats = Arc::new(CrawlStats::new());
        let ctx = Arc::new(WorkerContext {
            frontier: Arc::clone(&frontier),
            pages: Arc::clone(&pages),
            checkpoints: Arc::clone(&checkpoints),
            filter: Arc::new(UrlFilter::new(&self.config.scope)),
            client,
            stats: Arc::clone(&stats),
            active: Arc::clone(&active),
            settings: WorkerSettings::from_config(crawler),
        });

        let status_period = Duration::from_secs(crawler.status_interval.max(1));
        let checkpoint_period = Duration::from_secs(crawler.checkpoint_interval.max(1));
        let workers = crawler.workers as usize;

        self.transition(CrawlPhase::Running, Some(&checkpoints))?;
        checkpoints.checkpoint()?;

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let mut pool = JoinSet::new();
        for id in 1..=workers {
            let worker = Worker::new(id, Arc::clone(&ctx));
            pool.spawn(worker.run(shutdown_rx.clone()));
        }
        tracing::info!("Started {} workers", workers);

        let mut status_timer = interval_at(Instant::now() + status_period, status_period);
        status_timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut checkpoint_timer =
            interval_at(Instant::now() + checkpoint_period, checkpoint_period);
        checkpoint_timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tokio::pin!(shutdown);
        let mut interrupted = false;

        loop {
            tokio::select! {
                biased;

                _ = &mut shutdown, if !interrupted => {
                    interrupted = true;
                    let _ = shutdown_tx.send(true);
                    self.transition(CrawlPhase::Draining, Some(&checkpoints))?;
                    if let Err(e) = checkpoints.flush("interrupt") {
                        tracing::error!("Interrupt flush failed: {}", e);
                    }
                    tracing::info!(
                        "Waiting for {} active workers to finish their current page",
                        active.load(std::sync::atomic::Ordering::SeqCst)
                    );
                }

                joined = pool.join_next() => match joined {
                    Some(Ok(processed)) => {
                        tracing::trace!("Worker exited after {} URLs", processed);
                    }
                    Some(Err(e)) => {
                        tracing::error!("{}", CrawlError::Worker(e.to_string()));
                    }
                    None => break,
                },

                _ = status_timer.tick() => {
                    log_status(&frontier, &stats);
                }

                _ = checkpoint_timer.tick() => {
                    let result = checkpoints
                        .flush("timer")
                        .and_then(|()| checkpoints.checkpoint().map(|_| ()));
                    if let Err(e) = result {
                        tracing::error!("Periodic checkpoint failed: {}", e);
                    }
                }
            }
        }

        if !interrupted {
            tracing::info!("Frontier drained, crawl complete");
            self.transition(CrawlPhase::Draining, Some(&checkpoints))?;
        }

        checkpoints.flush("final")?;
        self.transition(CrawlPhase::Stopped, Some(&checkpoints))?;
        checkpoints.checkpoint()?;

        let counts = frontier.counts()?;
        let report = CrawlReport {
            status: if interrupted {
                CrawlStatus::Interrupted
            } else {
                CrawlStatus::Completed
            },
            scraped_total: counts.scraped,
            remaining: counts.queued + counts.in_flight,
            next_index: pages.next_index(),
            recovery,
            stats: stats.snapshot(),
        };

        tracing::info!(
            "Crawl {}: {} pages this run, {} scraped total, {} remaining",
            match report.status {
                CrawlStatus::Completed => "completed",
                CrawlStatus::Interrupted => "interrupted",
            },
            report.stats.pages_stored,
            report.scraped_total,
            report.remaining
        );

        Ok(report)
    }
}

/// Logs one status line; a storage error is logged and the crawl goes on
fn log_status(frontier: &Frontier, stats: &CrawlStats) -> bool {
    match frontier.counts() {
        Ok(counts) => {
            tracing::info!(
                "Queue: {} | Scraped: {} | In flight: {} | Time: {:.0}s",
                counts.queued,
                counts.scraped,
                counts.in_flight,
                stats.elapsed().as_secs_f64()
            );
            true
        }
        Err(e) => {
            tracing::error!("Status report failed: {}", e);
            false
        }
    }
}
