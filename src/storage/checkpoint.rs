//! Checkpoint and persistence manager
//!
//! Owns the three durability triggers (milestone, wall-clock timer,
//! shutdown). A flush rewrites the ledger and queue files through the
//! frontier; a checkpoint only writes the advisory `checkpoint.txt` status
//! file. Recovery needs nothing but the ledger and queue files.

use crate::crawler::frontier::Frontier;
use crate::state::CrawlPhase;
use crate::storage::pages::PageStore;
use crate::storage::traits::StorageResult;
use chrono::{DateTime, Local};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Advisory status written to the checkpoint file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckpointSnapshot {
    pub scraped_count: u64,
    pub queue_depth: usize,
    pub active_workers: usize,
    pub in_flight: usize,
    pub running_counter: u64,
    pub config_hash: String,
    pub phase: CrawlPhase,
    pub timestamp: DateTime<Local>,
}

impl fmt::Display for CheckpointSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Scraped: {}", self.scraped_count)?;
        writeln!(f, "Queue: {}", self.queue_depth)?;
        writeln!(f, "Active workers: {}", self.active_workers)?;
        writeln!(f, "In flight: {}", self.in_flight)?;
        writeln!(f, "Counter: {}", self.running_counter)?;
        writeln!(f, "Config hash: {}", self.config_hash)?;
        writeln!(f, "Phase: {}", self.phase)?;
        writeln!(
            f,
            "Timestamp: {}",
            self.timestamp.format("%Y-%m-%d %H:%M:%S")
        )
    }
}

/// Coordinates flushes and checkpoints for one crawl
pub struct CheckpointManager {
    frontier: Arc<Frontier>,
    pages: Arc<PageStore>,
    checkpoint_path: PathBuf,
    active_workers: Arc<AtomicUsize>,
    config_hash: String,
    phase: Mutex<CrawlPhase>,
}

impl CheckpointManager {
    pub fn new(
        frontier: Arc<Frontier>,
        pages: Arc<PageStore>,
        checkpoint_path: impl Into<PathBuf>,
        active_workers: Arc<AtomicUsize>,
        config_hash: impl Into<String>,
    ) -> Self {
        Self {
            frontier,
            pages,
            checkpoint_path: checkpoint_path.into(),
            active_workers,
            config_hash: config_hash.into(),
            phase: Mutex::new(CrawlPhase::Idle),
        }
    }

    pub fn checkpoint_path(&self) -> &Path {
        &self.checkpoint_path
    }

    /// Records the supervisor's current phase for the next checkpoint
    pub fn set_phase(&self, phase: CrawlPhase) {
        *self.phase.lock().unwrap_or_else(|e| e.into_inner()) = phase;
    }

    fn phase(&self) -> CrawlPhase {
        *self.phase.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Rewrites the ledger and queue files from the frontier's state
    pub fn flush(&self, reason: &str) -> StorageResult<()> {
        let (scraped, remaining) = self.frontier.flush()?;
        tracing::info!(
            "Flushed state ({}): {} scraped, {} pending",
            reason,
            scraped,
            remaining
        );
        Ok(())
    }

    /// Captures the current counters
    pub fn snapshot(&self) -> StorageResult<CheckpointSnapshot> {
        let counts = self.frontier.counts()?;
        Ok(CheckpointSnapshot {
            scraped_count: counts.scraped,
            queue_depth: counts.queued,
            active_workers: self.active_workers.load(Ordering::SeqCst),
            in_flight: counts.in_flight,
            running_counter: self.pages.next_index(),
            config_hash: self.config_hash.clone(),
            phase: self.phase(),
            timestamp: Local::now(),
        })
    }

    /// Writes the advisory checkpoint file
    ///
    /// Observational only: the ledger and queue files are not touched.
    pub fn checkpoint(&self) -> StorageResult<CheckpointSnapshot> {
        let snapshot = self.snapshot()?;
        fs::write(&self.checkpoint_path, snapshot.to_string())?;
        tracing::info!(
            "Checkpoint: {} scraped, {} queued",
            snapshot.scraped_count,
            snapshot.queue_depth
        );
        Ok(snapshot)
    }
}
