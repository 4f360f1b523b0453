//! Output module for operator-facing reports
//!
//! This module handles:
//! - Live crawl counters shared by the workers
//! - Offline statistics read back from the durable files
//! - End-of-run summaries

pub mod stats;

pub use stats::{
    load_statistics, print_run_summary, print_statistics, CrawlStatistics, CrawlStats,
    StatsSnapshot,
};
