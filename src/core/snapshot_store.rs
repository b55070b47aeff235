//! Snapshot store with file-based persistence.
//!
//! The whole catalog is stored as a single pretty-printed JSON document and
//! rewritten in full on every save. Writes go to a temp file in the same
//! directory which is then renamed over the snapshot, so readers never see
//! a half-written file.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use thiserror::Error;

use crate::domain::{Book, BookKind, BookType};

/// Snapshot format version (written, never checked)
const SNAPSHOT_VERSION: u32 = 1;

/// Errors reading or writing the snapshot file
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Corrupt snapshot {path}: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl SnapshotError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// On-disk document
#[derive(Debug, Serialize, Deserialize)]
struct SnapshotFile {
    #[serde(default = "default_version")]
    version: u32,

    #[serde(default)]
    books: Vec<BookRecord>,
}

fn default_version() -> u32 {
    SNAPSHOT_VERSION
}

/// One book as stored on disk
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookRecord {
    /// Variant tag ("Fiction", "Non-Fiction", "Reference")
    #[serde(rename = "type")]
    pub book_type: BookType,

    pub isbn: String,
    pub title: String,
    pub author: String,
    pub publication_year: i32,

    /// Genre, subject or category depending on the variant
    pub detail: String,

    #[serde(default)]
    pub on_loan: bool,

    #[serde(default)]
    pub borrower: Option<String>,

    #[serde(default)]
    pub loan_date: Option<NaiveDate>,

    #[serde(default)]
    pub due_date: Option<NaiveDate>,
}

impl From<&Book> for BookRecord {
    fn from(book: &Book) -> Self {
        Self {
            book_type: book.book_type(),
            isbn: book.isbn().to_string(),
            title: book.title.clone(),
            author: book.author.clone(),
            publication_year: book.publication_year,
            detail: book.kind().detail().to_string(),
            on_loan: book.is_on_loan(),
            borrower: book.borrower().map(str::to_string),
            loan_date: book.loan_date(),
            due_date: book.due_date(),
        }
    }
}

impl From<BookRecord> for Book {
    fn from(record: BookRecord) -> Self {
        let mut book = Book::new(
            BookKind::new(record.book_type, record.detail),
            record.isbn,
            record.title,
            record.author,
            record.publication_year,
        );

        // A loan survives only with its borrower and both dates; anything
        // partial loads as available.
        book.set_on_loan(record.on_loan);
        if book.is_on_loan() {
            book.borrower = record.borrower;
            book.loan_date = record.loan_date;
            book.due_date = record.due_date;
            if !book.has_consistent_loan() {
                book.clear_loan();
            }
        }
        book
    }
}

/// File-based snapshot store
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    /// Path to the snapshot JSON file
    path: PathBuf,
}

impl SnapshotStore {
    /// Create a store backed by `path` (nothing is touched until load/save)
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at the configured data file location
    pub fn open_default() -> anyhow::Result<Self> {
        Ok(Self::new(crate::config::data_file_path()?))
    }

    /// Get the path to the snapshot file
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".lock");
        self.path.with_file_name(name)
    }

    /// Read every book from the snapshot.
    ///
    /// A missing file is the first-run case and yields an empty list.
    /// Unreadable or unparseable content is an error; nothing is recovered
    /// from a partially valid file.
    pub fn load(&self) -> Result<Vec<Book>, SnapshotError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let content =
            fs::read_to_string(&self.path).map_err(|e| SnapshotError::io(&self.path, e))?;

        let snapshot: SnapshotFile =
            serde_json::from_str(&content).map_err(|source| SnapshotError::Corrupt {
                path: self.path.clone(),
                source,
            })?;

        Ok(snapshot.books.into_iter().map(Book::from).collect())
    }

    /// Overwrite the snapshot with `books`, preserving their order
    pub fn save(&self, books: &[Book]) -> Result<(), SnapshotError> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir).map_err(|e| SnapshotError::io(&dir, e))?;

        let snapshot = SnapshotFile {
            version: SNAPSHOT_VERSION,
            books: books.iter().map(BookRecord::from).collect(),
        };
        let json = serde_json::to_string_pretty(&snapshot)?;

        // Advisory lock so two processes never interleave rename and write
        let lock_path = self.lock_path();
        let lock = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(&lock_path)
            .map_err(|e| SnapshotError::io(&lock_path, e))?;
        lock.lock_exclusive()
            .map_err(|e| SnapshotError::io(&lock_path, e))?;

        let tmp = write_temp(&dir, json.as_bytes()).map_err(|e| SnapshotError::io(&dir, e))?;
        tmp.persist(&self.path)
            .map_err(|e| SnapshotError::io(&self.path, e.error))?;

        // Lock is released when the file is dropped
        Ok(())
    }
}

/// Write `bytes` to a fresh temp file in `dir` and sync it to disk
fn write_temp(dir: &Path, bytes: &[u8]) -> std::io::Result<NamedTempFile> {
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.flush()?;
    tmp.as_file().sync_all()?;
    Ok(tmp)
}
