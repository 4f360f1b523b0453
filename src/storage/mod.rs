//! Storage module for persisting crawl data
//!
//! This module handles everything the crawler writes to disk:
//! - Numbered page files (the Page Store)
//! - The scraped ledger and the queue snapshot
//! - Membership sets for deduplication (in memory or SQLite)
//! - The advisory checkpoint file

pub mod checkpoint;
mod index;
mod journal;
pub mod pages;
mod traits;

pub use checkpoint::{CheckpointManager, CheckpointSnapshot};
pub use index::{MemoryIndex, SqliteIndex};
pub use journal::{read_url_list, UrlJournal};
pub use pages::{scan_indices, PageRecord, PageStore};
pub use traits::{MembershipIndex, StorageError, StorageResult};

use crate::config::{MembershipBackend, OutputConfig};
use std::path::Path;

/// Opens the membership index selected in the output configuration
pub fn open_index(output: &OutputConfig) -> StorageResult<Box<dyn MembershipIndex>> {
    match output.membership {
        MembershipBackend::Memory => Ok(Box::new(MemoryIndex::new())),
        MembershipBackend::Sqlite => {
            let index = SqliteIndex::new(Path::new(&output.index_path))?;
            tracing::debug!("Opened SQLite membership index at {}", output.index_path);
            Ok(Box::new(index))
        }
    }
}

/// Builds the journal over the configured ledger and queue files
pub fn open_journal(output: &OutputConfig) -> UrlJournal {
    UrlJournal::new(&output.scraped_file, &output.queue_file)
}
