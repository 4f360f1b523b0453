//! Crawl statistics
//!
//! [`CrawlStats`] holds the live counters shared by the workers and
//! read by the supervisor's status timer. [`load_statistics`] builds an
//! offline summary from the durable files for `--stats`.

use crate::config::OutputConfig;
use crate::crawler::FailureKind;
use crate::storage::{read_url_list, scan_indices, StorageResult};
use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};
use url::Url;

/// Live counters for one crawl run
#[derive(Debug)]
pub struct CrawlStats {
    started: Instant,
    pages_stored: AtomicU64,
    duplicates: AtomicU64,
    non_html: AtomicU64,
    links_discovered: AtomicU64,
    links_enqueued: AtomicU64,
    failures: Mutex<BTreeMap<FailureKind, u64>>,
}

impl Default for CrawlStats {
    fn default() -> Self {
        Self::new()
    }
}

impl CrawlStats {
    pub fn new() -> Self {
        Self {
            started: Instant::now(),
            pages_stored: AtomicU64::new(0),
            duplicates: AtomicU64::new(0),
            non_html: AtomicU64::new(0),
            links_discovered: AtomicU64::new(0),
            links_enqueued: AtomicU64::new(0),
            failures: Mutex::new(BTreeMap::new()),
        }
    }

    pub fn record_stored(&self) {
        self.pages_stored.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_duplicate(&self) {
        self.duplicates.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_non_html(&self) {
        self.non_html.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_links(&self, discovered: usize, enqueued: usize) {
        self.links_discovered
            .fetch_add(discovered as u64, Ordering::Relaxed);
        self.links_enqueued
            .fetch_add(enqueued as u64, Ordering::Relaxed);
    }

    pub fn record_failure(&self, kind: FailureKind) {
        let mut failures = self.failures.lock().unwrap_or_else(|e| e.into_inner());
        *failures.entry(kind).or_insert(0) += 1;
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Copies the current counter values
    pub fn snapshot(&self) -> StatsSnapshot {
        let failures = self
            .failures
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone();
        StatsSnapshot {
            elapsed: self.elapsed(),
            pages_stored: self.pages_stored.load(Ordering::Relaxed),
            duplicates: self.duplicates.load(Ordering::Relaxed),
            non_html: self.non_html.load(Ordering::Relaxed),
            links_discovered: self.links_discovered.load(Ordering::Relaxed),
            links_enqueued: self.links_enqueued.load(Ordering::Relaxed),
            failures,
        }
    }
}

/// Copy of [`CrawlStats`] at one point in time
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub elapsed: Duration,
    pub pages_stored: u64,
    pub duplicates: u64,
    pub non_html: u64,
    pub links_discovered: u64,
    pub links_enqueued: u64,
    pub failures: BTreeMap<FailureKind, u64>,
}

impl StatsSnapshot {
    pub fn total_failures(&self) -> u64 {
        self.failures.values().sum()
    }

    /// Count for every failure kind, including the ones that never occurred
    pub fn failure_breakdown(&self) -> Vec<(FailureKind, u64)> {
        FailureKind::all()
            .into_iter()
            .map(|kind| (kind, self.failures.get(&kind).copied().unwrap_or(0)))
            .collect()
    }

    /// Pages stored per minute of wall-clock time
    pub fn pages_per_minute(&self) -> f64 {
        let minutes = self.elapsed.as_secs_f64() / 60.0;
        if minutes > 0.0 {
            self.pages_stored as f64 / minutes
        } else {
            0.0
        }
    }
}

/// Offline summary of an output directory
#[derive(Debug, Clone)]
pub struct CrawlStatistics {
    /// Entries in the scraped ledger
    pub scraped_count: u64,

    /// Entries in the queue file
    pub queue_depth: u64,

    /// Queue entries that also appear in the ledger
    pub queue_overlap: u64,

    /// Numbered page files on disk
    pub page_files: u64,

    /// Highest page index on disk
    pub highest_index: Option<u64>,

    /// Ledger entries per host
    pub scraped_by_host: BTreeMap<String, u64>,

    /// Contents of the last checkpoint file, if any
    pub last_checkpoint: Option<String>,
}

/// Loads statistics from the durable files named in the output config
pub fn load_statistics(output: &OutputConfig) -> StorageResult<CrawlStatistics> {
    let scraped = read_url_list(Path::new(&output.scraped_file))?;
    let queued = read_url_list(Path::new(&output.queue_file))?;
    let indices = scan_indices(Path::new(&output.pages_dir), &output.page_extension)?;

    let scraped_set: HashSet<&str> = scraped.iter().map(String::as_str).collect();
    let queue_overlap = queued
        .iter()
        .filter(|url| scraped_set.contains(url.as_str()))
        .count() as u64;

    let mut scraped_by_host = BTreeMap::new();
    for url in &scraped {
        let host = Url::parse(url)
            .ok()
            .and_then(|u| u.host_str().map(str::to_string))
            .unwrap_or_else(|| "(invalid)".to_string());
        *scraped_by_host.entry(host).or_insert(0) += 1;
    }

    let checkpoint_path = Path::new(&output.checkpoint_file);
    let last_checkpoint = if checkpoint_path.exists() {
        Some(std::fs::read_to_string(checkpoint_path)?)
    } else {
        None
    };

    Ok(CrawlStatistics {
        scraped_count: scraped_set.len() as u64,
        queue_depth: queued.len() as u64,
        queue_overlap,
        page_files: indices.len() as u64,
        highest_index: indices.last().copied(),
        scraped_by_host,
        last_checkpoint,
    })
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &CrawlStatistics) {
    println!("=== Crawl Statistics ===\n");

    println!("Overview:");
    println!("  Scraped URLs: {}", stats.scraped_count);
    println!("  Queued URLs: {}", stats.queue_depth);
    if stats.queue_overlap > 0 {
        println!(
            "  Queued URLs already scraped: {} (removed on next start)",
            stats.queue_overlap
        );
    }
    println!("  Page files: {}", stats.page_files);
    match stats.highest_index {
        Some(index) => println!("  Next page index: {}", index + 1),
        None => println!("  Next page index: 0"),
    }
    println!();

    if !stats.scraped_by_host.is_empty() {
        println!("Scraped by Host:");
        let mut hosts: Vec<_> = stats.scraped_by_host.iter().collect();
        hosts.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));

        for (host, count) in hosts {
            let percentage = if stats.scraped_count > 0 {
                (*count as f64 / stats.scraped_count as f64) * 100.0
            } else {
                0.0
            };
            println!("  {}: {} ({:.1}%)", host, count, percentage);
        }
        println!();
    }

    if let Some(checkpoint) = &stats.last_checkpoint {
        println!("Last Checkpoint:");
        for line in checkpoint.lines() {
            println!("  {}", line);
        }
    }
}

/// Prints the per-run counters at the end of a crawl
pub fn print_run_summary(snapshot: &StatsSnapshot) {
    println!("=== Run Summary ===\n");
    println!("  Pages stored: {}", snapshot.pages_stored);
    println!("  Duplicates skipped: {}", snapshot.duplicates);
    println!("  Non-HTML skipped: {}", snapshot.non_html);
    println!(
        "  Links discovered: {} ({} new)",
        snapshot.links_discovered, snapshot.links_enqueued
    );
    println!("  Elapsed: {:.1}s", snapshot.elapsed.as_secs_f64());
    println!("  Rate: {:.1} pages/min", snapshot.pages_per_minute());

    println!("\nFailures ({}):", snapshot.total_failures());
    for (kind, count) in snapshot.failure_breakdown() {
        println!("  {:<14} {}", kind.as_str(), count);
    }
}
