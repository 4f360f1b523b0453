//! Membership index implementations
//!
//! [`MemoryIndex`] keeps both sets in `HashSet`s and suits crawls of a single
//! campus. [`SqliteIndex`] keeps them in a SQLite file so membership checks
//! do not hold every URL in memory. Either way the frontier rebuilds the
//! index from the ledger and queue files when a crawl starts.

use crate::storage::traits::{MembershipIndex, StorageResult};
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::HashSet;
use std::path::Path;

/// In-memory membership sets
#[derive(Debug, Default)]
pub struct MemoryIndex {
    queued: HashSet<String>,
    scraped: HashSet<String>,
}

impl MemoryIndex {
    pub fn new() -> Self {
        Self::default()
    }
}

impl MembershipIndex for MemoryIndex {
    fn is_scraped(&self, url: &str) -> StorageResult<bool> {
        Ok(self.scraped.contains(url))
    }

    fn is_queued(&self, url: &str) -> StorageResult<bool> {
        Ok(self.queued.contains(url))
    }

    fn mark_queued(&mut self, url: &str) -> StorageResult<bool> {
        Ok(self.queued.insert(url.to_string()))
    }

    fn unmark_queued(&mut self, url: &str) -> StorageResult<()> {
        self.queued.remove(url);
        Ok(())
    }

    fn mark_scraped(&mut self, url: &str) -> StorageResult<bool> {
        Ok(self.scraped.insert(url.to_string()))
    }

    fn scraped_count(&self) -> StorageResult<u64> {
        Ok(self.scraped.len() as u64)
    }

    fn scraped_urls(&self) -> StorageResult<Vec<String>> {
        let mut urls: Vec<String> = self.scraped.iter().cloned().collect();
        urls.sort();
        Ok(urls)
    }

    fn clear(&mut self) -> StorageResult<()> {
        self.queued.clear();
        self.scraped.clear();
        Ok(())
    }
}

const INDEX_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS scraped (
    url TEXT PRIMARY KEY
) WITHOUT ROWID;

CREATE TABLE IF NOT EXISTS queued (
    url TEXT PRIMARY KEY
) WITHOUT ROWID;
"#;

/// SQLite-backed membership sets
pub struct SqliteIndex {
    conn: Connection,
}

impl SqliteIndex {
    /// Opens or creates the index file
    pub fn new(path: &Path) -> StorageResult<Self> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
        ",
        )?;
        conn.execute_batch(INDEX_SCHEMA)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database (for testing)
    #[cfg(test)]
    pub fn new_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(INDEX_SCHEMA)?;
        Ok(Self { conn })
    }

    fn contains(&self, table: &str, url: &str) -> StorageResult<bool> {
        let sql = format!("SELECT 1 FROM {} WHERE url = ?1", table);
        let mut stmt = self.conn.prepare_cached(&sql)?;
        let found = stmt
            .query_row(params![url], |_| Ok(()))
            .optional()?
            .is_some();
        Ok(found)
    }

    fn insert(&self, table: &str, url: &str) -> StorageResult<bool> {
        let sql = format!("INSERT OR IGNORE INTO {} (url) VALUES (?1)", table);
        let mut stmt = self.conn.prepare_cached(&sql)?;
        Ok(stmt.execute(params![url])? == 1)
    }
}

impl MembershipIndex for SqliteIndex {
    fn is_scraped(&self, url: &str) -> StorageResult<bool> {
        self.contains("scraped", url)
    }

    fn is_queued(&self, url: &str) -> StorageResult<bool> {
        self.contains("queued", url)
    }

    fn mark_queued(&mut self, url: &str) -> StorageResult<bool> {
        self.insert("queued", url)
    }

    fn unmark_queued(&mut self, url: &str) -> StorageResult<()> {
        let mut stmt = self
            .conn
            .prepare_cached("DELETE FROM queued WHERE url = ?1")?;
        stmt.execute(params![url])?;
        Ok(())
    }

    fn mark_scraped(&mut self, url: &str) -> StorageResult<bool> {
        self.insert("scraped", url)
    }

    fn scraped_count(&self) -> StorageResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM scraped", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    fn scraped_urls(&self) -> StorageResult<Vec<String>> {
        let mut stmt = self.conn.prepare("SELECT url FROM scraped ORDER BY url")?;
        let urls = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(urls)
    }

    fn clear(&mut self) -> StorageResult<()> {
        self.conn
            .execute_batch("DELETE FROM queued; DELETE FROM scraped;")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exercise(index: &mut dyn MembershipIndex) {
        let url = "https://www.example.edu/a";

        assert!(!index.is_queued(url).unwrap());
        assert!(index.mark_queued(url).unwrap());
        assert!(!index.mark_queued(url).unwrap());
        assert!(index.is_queued(url).unwrap());

        index.unmark_queued(url).unwrap();
        assert!(!index.is_queued(url).unwrap());

        assert!(index.mark_scraped(url).unwrap());
        assert!(!index.mark_scraped(url).unwrap());
        assert!(index.is_scraped(url).unwrap());
        assert!(index.mark_scraped("https://www.example.edu/0").unwrap());

        assert_eq!(index.scraped_count().unwrap(), 2);
        assert_eq!(
            index.scraped_urls().unwrap(),
            vec![
                "https://www.example.edu/0".to_string(),
                "https://www.example.edu/a".to_string()
            ]
        );

        index.mark_queued("https://www.example.edu/b").unwrap();
        index.clear().unwrap();
        assert_eq!(index.scraped_count().unwrap(), 0);
        assert!(!index.is_queued("https://www.example.edu/b").unwrap());
        assert!(!index.is_scraped(url).unwrap());
    }

    #[test]
    fn test_memory_index() {
        let mut index = MemoryIndex::new();
        exercise(&mut index);
    }

    #[test]
    fn test_sqlite_index() {
        let mut index = SqliteIndex::new_in_memory().unwrap();
        exercise(&mut index);
    }

    #[test]
    fn test_sqlite_index_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("membership.db");

        {
            let mut index = SqliteIndex::new(&path).unwrap();
            index.mark_scraped("https://www.example.edu/kept").unwrap();
        }

        let index = SqliteIndex::new(&path).unwrap();
        assert!(index.is_scraped("https://www.example.edu/kept").unwrap());
        assert_eq!(index.scraped_count().unwrap(), 1);
    }
}
