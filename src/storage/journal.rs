//! Durable URL lists: the scraped ledger and the frontier snapshot
//!
//! Both files hold one URL per line. During steady state they only grow by
//! appends; a flush rewrites them whole through a temp file and a rename so a
//! crash mid-flush leaves the previous contents in place.

use crate::storage::traits::StorageResult;
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

/// Paths of the ledger and queue files
#[derive(Debug, Clone)]
pub struct UrlJournal {
    scraped_path: PathBuf,
    queue_path: PathBuf,
}

impl UrlJournal {
    pub fn new(scraped_path: impl Into<PathBuf>, queue_path: impl Into<PathBuf>) -> Self {
        Self {
            scraped_path: scraped_path.into(),
            queue_path: queue_path.into(),
        }
    }

    pub fn scraped_path(&self) -> &Path {
        &self.scraped_path
    }

    pub fn queue_path(&self) -> &Path {
        &self.queue_path
    }

    /// Reads the scraped ledger (empty if the file does not exist)
    pub fn load_scraped(&self) -> StorageResult<Vec<String>> {
        read_url_list(&self.scraped_path)
    }

    /// Reads the queue file (empty if the file does not exist)
    pub fn load_queue(&self) -> StorageResult<Vec<String>> {
        read_url_list(&self.queue_path)
    }

    /// Appends one URL to the scraped ledger
    pub fn append_scraped(&self, url: &str) -> StorageResult<()> {
        append_lines(&self.scraped_path, std::iter::once(url))
    }

    /// Appends newly discovered URLs to the queue file
    pub fn append_queued(&self, urls: &[String]) -> StorageResult<()> {
        if urls.is_empty() {
            return Ok(());
        }
        append_lines(&self.queue_path, urls.iter().map(String::as_str))
    }

    /// Replaces both files with the given contents
    ///
    /// `scraped` is written as given (callers pass it sorted); `remaining` is
    /// sorted before writing.
    pub fn rewrite(&self, scraped: &[String], remaining: &[String]) -> StorageResult<()> {
        let mut remaining = remaining.to_vec();
        remaining.sort();
        remaining.dedup();

        write_list_atomic(&self.scraped_path, scraped)?;
        write_list_atomic(&self.queue_path, &remaining)?;
        Ok(())
    }
}

/// Reads a one-URL-per-line file, skipping blank lines
pub fn read_url_list(path: &Path) -> StorageResult<Vec<String>> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let reader = BufReader::new(File::open(path)?);
    let mut urls = Vec::new();
    for line in reader.lines() {
        let line = line?;
        let trimmed = line.trim();
        if !trimmed.is_empty() {
            urls.push(trimmed.to_string());
        }
    }
    Ok(urls)
}

fn append_lines<'a>(path: &Path, lines: impl Iterator<Item = &'a str>) -> StorageResult<()> {
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    let mut writer = BufWriter::new(file);
    for line in lines {
        writeln!(writer, "{}", line)?;
    }
    writer.flush()?;
    Ok(())
}

fn write_list_atomic(path: &Path, urls: &[String]) -> StorageResult<()> {
    let tmp_path = temp_path_for(path);
    {
        let mut writer = BufWriter::new(File::create(&tmp_path)?);
        for url in urls {
            writeln!(writer, "{}", url)?;
        }
        writer.flush()?;
        writer.get_ref().sync_all()?;
    }
    fs::rename(&tmp_path, path)?;
    Ok(())
}

fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn journal(dir: &TempDir) -> UrlJournal {
        UrlJournal::new(
            dir.path().join("scraped_urls.txt"),
            dir.path().join("queued_urls.txt"),
        )
    }

    #[test]
    fn test_missing_files_load_empty() {
        let dir = tempfile::tempdir().unwrap();
        let journal = journal(&dir);
        assert!(journal.load_scraped().unwrap().is_empty());
        assert!(journal.load_queue().unwrap().is_empty());
    }

    #[test]
    fn test_append_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let journal = journal(&dir);

        journal.append_scraped("https://www.example.edu/a").unwrap();
        journal.append_scraped("https://www.example.edu/b").unwrap();
        journal
            .append_queued(&["https://www.example.edu/c".to_string()])
            .unwrap();

        assert_eq!(
            journal.load_scraped().unwrap(),
            vec!["https://www.example.edu/a", "https://www.example.edu/b"]
        );
        assert_eq!(
            journal.load_queue().unwrap(),
            vec!["https://www.example.edu/c"]
        );
    }

    #[test]
    fn test_rewrite_replaces_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        let journal = journal(&dir);

        journal
            .append_queued(&["https://www.example.edu/stale".to_string()])
            .unwrap();
        journal
            .rewrite(
                &["https://www.example.edu/a".to_string()],
                &[
                    "https://www.example.edu/z".to_string(),
                    "https://www.example.edu/m".to_string(),
                ],
            )
            .unwrap();

        assert_eq!(
            journal.load_queue().unwrap(),
            vec!["https://www.example.edu/m", "https://www.example.edu/z"]
        );
        assert_eq!(
            journal.load_scraped().unwrap(),
            vec!["https://www.example.edu/a"]
        );
        assert!(!dir.path().join("queued_urls.txt.tmp").exists());
    }

    #[test]
    fn test_blank_lines_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("list.txt");
        fs::write(&path, "https://www.example.edu/a\n\n  \nhttps://www.example.edu/b  \n").unwrap();

        assert_eq!(
            read_url_list(&path).unwrap(),
            vec!["https://www.example.edu/a", "https://www.example.edu/b"]
        );
    }
}
