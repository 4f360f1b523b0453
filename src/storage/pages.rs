//! Page Store: one immutable text file per stored page
//!
//! Files are named by a zero-padded sequence number (`00042.txt`) and hold
//! the source URL on the first line, a blank line, then the extracted body.
//! That layout is read by the downstream chunking pipeline and must not
//! change.

use crate::storage::traits::{StorageError, StorageResult};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

const URL_PREFIX: &str = "URL: ";

/// One persisted unit of crawled content
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRecord {
    pub sequence_index: u64,
    pub source_url: String,
    pub body: String,
}

impl PageRecord {
    /// Renders the on-disk file contents
    pub fn render(&self) -> String {
        format!("{}{}\n\n{}", URL_PREFIX, self.source_url, self.body)
    }

    /// Parses file contents written by [`PageRecord::render`]
    pub fn parse(sequence_index: u64, contents: &str) -> Result<Self, String> {
        let (first, rest) = contents.split_once('\n').unwrap_or((contents, ""));
        let source_url = first
            .strip_prefix(URL_PREFIX)
            .ok_or_else(|| "first line does not start with 'URL: '".to_string())?
            .trim_end_matches('\r')
            .to_string();

        let body = match rest.split_once('\n') {
            Some((blank, body)) if blank.trim().is_empty() => body.to_string(),
            None if rest.trim().is_empty() => String::new(),
            _ => return Err("second line is not blank".to_string()),
        };

        Ok(Self {
            sequence_index,
            source_url,
            body,
        })
    }
}

/// Writes page files and hands out sequence numbers
#[derive(Debug)]
pub struct PageStore {
    dir: PathBuf,
    extension: String,
    width: usize,
    next_index: Mutex<u64>,
}

impl PageStore {
    /// Opens (creating if needed) the page directory
    ///
    /// Numbering resumes after the highest index already on disk, and never
    /// below `floor` (the ledger size), so indices stay unique for the life
    /// of the directory even across crashes.
    pub fn open(
        dir: impl Into<PathBuf>,
        extension: &str,
        width: usize,
        floor: u64,
    ) -> StorageResult<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;

        let highest = scan_indices(&dir, extension)?.into_iter().max();
        let next = highest.map_or(0, |h| h + 1).max(floor);

        tracing::debug!(
            "Page store at {} resumes numbering at {}",
            dir.display(),
            next
        );

        Ok(Self {
            dir,
            extension: extension.to_string(),
            width,
            next_index: Mutex::new(next),
        })
    }

    /// Index the next stored page will receive
    pub fn next_index(&self) -> u64 {
        *self.next_index.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File path for a given sequence index
    pub fn path_for(&self, index: u64) -> PathBuf {
        self.dir.join(format!(
            "{:0width$}.{}",
            index,
            self.extension,
            width = self.width
        ))
    }

    /// Assigns the next sequence index and writes the page file
    ///
    /// The counter lock is held through the write so file creation order
    /// matches index order. An index whose write fails is not reused.
    pub fn write(&self, source_url: &str, body: &str) -> StorageResult<PageRecord> {
        let mut next = self.next_index.lock().unwrap_or_else(|e| e.into_inner());
        let index = *next;
        *next += 1;

        let record = PageRecord {
            sequence_index: index,
            source_url: source_url.to_string(),
            body: body.to_string(),
        };

        let path = self.path_for(index);
        let mut file = match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                return Err(StorageError::PageExists(path));
            }
            Err(e) => return Err(e.into()),
        };
        file.write_all(record.render().as_bytes())?;
        file.flush()?;

        Ok(record)
    }

    /// Reads a stored page back
    pub fn read(&self, index: u64) -> StorageResult<PageRecord> {
        let path = self.path_for(index);
        let contents = fs::read_to_string(&path)?;
        PageRecord::parse(index, &contents)
            .map_err(|reason| StorageError::MalformedPage { path, reason })
    }
}

/// Lists the sequence indices of page files in a directory
pub fn scan_indices(dir: &Path, extension: &str) -> StorageResult<Vec<u64>> {
    if !dir.exists() {
        return Ok(Vec::new());
    }

    let suffix = format!(".{}", extension);
    let mut indices = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name();
        let Some(name) = name.to_str() else {
            continue;
        };
        let Some(stem) = name.strip_suffix(suffix.as_str()) else {
            continue;
        };
        if !stem.is_empty() && stem.chars().all(|c| c.is_ascii_digit()) {
            if let Ok(index) = stem.parse::<u64>() {
                indices.push(index);
            }
        }
    }
    indices.sort_unstable();
    Ok(indices)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_format() {
        let record = PageRecord {
            sequence_index: 7,
            source_url: "https://www.example.edu/about".to_string(),
            body: "About\nOur campus".to_string(),
        };
        assert_eq!(
            record.render(),
            "URL: https://www.example.edu/about\n\nAbout\nOur campus"
        );
    }

    #[test]
    fn test_parse_rendered() {
        let contents = "URL: https://www.example.edu/a\n\nLine one\nLine two";
        let record = PageRecord::parse(3, contents).unwrap();
        assert_eq!(record.source_url, "https://www.example.edu/a");
        assert_eq!(record.body, "Line one\nLine two");
        assert_eq!(record.sequence_index, 3);
    }

    #[test]
    fn test_parse_rejects_missing_header() {
        assert!(PageRecord::parse(0, "no header\n\nbody").is_err());
        assert!(PageRecord::parse(0, "URL: x\nnot blank\nbody").is_err());
    }

    #[test]
    fn test_write_names_and_sequence() {
        let dir = tempfile::tempdir().unwrap();
        let store = PageStore::open(dir.path(), "txt", 5, 0).unwrap();

        let first = store.write("https://www.example.edu/a", "A").unwrap();
        let second = store.write("https://www.example.edu/b", "B").unwrap();

        assert_eq!(first.sequence_index, 0);
        assert_eq!(second.sequence_index, 1);
        assert!(dir.path().join("00000.txt").exists());
        assert!(dir.path().join("00001.txt").exists());
        assert_eq!(store.next_index(), 2);

        let read = store.read(1).unwrap();
        assert_eq!(read, second);
    }

    #[test]
    fn test_resume_after_existing_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("00004.txt"), "URL: x\n\nbody").unwrap();
        fs::write(dir.path().join("00002.txt"), "URL: y\n\nbody").unwrap();
        fs::write(dir.path().join("notes.md"), "ignored").unwrap();

        let store = PageStore::open(dir.path(), "txt", 5, 0).unwrap();
        assert_eq!(store.next_index(), 5);

        let store = PageStore::open(dir.path(), "txt", 5, 10).unwrap();
        assert_eq!(store.next_index(), 10);
    }

    #[test]
    fn test_never_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let store = PageStore::open(dir.path(), "txt", 5, 0).unwrap();
        // Appears after the store was opened
        fs::write(dir.path().join("00000.txt"), "URL: other\n\nkeep").unwrap();

        let result = store.write("https://www.example.edu/a", "A");
        assert!(matches!(result, Err(StorageError::PageExists(_))));

        let next = store.write("https://www.example.edu/a", "A").unwrap();
        assert_eq!(next.sequence_index, 1);
        assert_eq!(
            fs::read_to_string(dir.path().join("00000.txt")).unwrap(),
            "URL: other\n\nkeep"
        );
    }

    #[test]
    fn test_scan_indices() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("00010.txt"), "").unwrap();
        fs::write(dir.path().join("00003.txt"), "").unwrap();
        fs::write(dir.path().join("x3.txt"), "").unwrap();
        fs::write(dir.path().join("00005.html"), "").unwrap();

        assert_eq!(scan_indices(dir.path(), "txt").unwrap(), vec![3, 10]);
    }
}
