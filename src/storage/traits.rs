//! Storage traits and error types
//!
//! This module defines the membership-index interface behind which the
//! frontier keeps its `queued` and `scraped` sets, and the error type shared
//! by every storage component.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Page file already exists: {0}")]
    PageExists(PathBuf),

    #[error("Malformed page file {path}: {reason}")]
    MalformedPage { path: PathBuf, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Membership sets tracked by the frontier
///
/// Implementations only answer membership questions; ordering and the work
/// queue itself stay in the frontier. All calls happen under the frontier
/// lock, so implementations need `Send` but not `Sync`.
pub trait MembershipIndex: Send {
    /// Returns true if the URL has been stored as a page
    fn is_scraped(&self, url: &str) -> StorageResult<bool>;

    /// Returns true if the URL is waiting in the queue
    fn is_queued(&self, url: &str) -> StorageResult<bool>;

    /// Marks a URL as queued; returns false if it already was
    fn mark_queued(&mut self, url: &str) -> StorageResult<bool>;

    /// Clears the queued marker of a URL
    fn unmark_queued(&mut self, url: &str) -> StorageResult<()>;

    /// Records a URL as scraped; returns false if it already was
    fn mark_scraped(&mut self, url: &str) -> StorageResult<bool>;

    /// Number of scraped URLs
    fn scraped_count(&self) -> StorageResult<u64>;

    /// All scraped URLs, sorted
    fn scraped_urls(&self) -> StorageResult<Vec<String>>;

    /// Drops everything
    fn clear(&mut self) -> StorageResult<()>;
}
