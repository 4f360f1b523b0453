//! Crawler module for web page fetching and processing
//!
//! This module contains the core crawling logic, including:
//! - The shared frontier with deduplication
//! - HTTP fetching and failure classification
//! - HTML text and link extraction
//! - The worker pool and the supervisor that drives it

mod fetcher;
pub mod frontier;
mod parser;
mod supervisor;
mod worker;

pub use fetcher::{build_http_client, fetch_url, is_html, user_agent_string, FailureKind, FetchResult};
pub use frontier::{Dequeued, Frontier, FrontierCounts, RecoveryReport};
pub use parser::{html_to_text, parse_html, resolve_link, ParsedPage};
pub use supervisor::{CrawlReport, CrawlStatus, Supervisor};
pub use worker::{IterationOutcome, Worker, WorkerContext, WorkerSettings};

use crate::config::Config;
use crate::CrawlError;

/// Runs a complete crawl operation
///
/// This is the main entry point for starting a crawl. It will:
/// 1. Recover the frontier from the ledger and queue files (or seed it)
/// 2. Open the page store, resuming its numbering
/// 3. Run the worker pool until the frontier drains or Ctrl+C
/// 4. Flush final state and write the checkpoint file
///
/// # Arguments
///
/// * `config` - The validated crawler configuration
/// * `config_hash` - Hash of the configuration file
/// * `fresh` - Ignore prior ledger and queue files
pub async fn crawl(
    config: Config,
    config_hash: impl Into<String>,
    fresh: bool,
) -> Result<CrawlReport, CrawlError> {
    Supervisor::new(config, config_hash, fresh).run().await
}
