//! Catalog of every book on the shelf.
//!
//! The collection lives behind a copy-on-write `Arc`: readers grab the
//! current snapshot and scan it without holding any lock, while each
//! mutation clones the list, edits the clone, swaps it in and then writes
//! the new state to the [`SnapshotStore`].
//!
//! A failed save is logged and remembered (see
//! [`Catalog::has_unsaved_changes`]) but never rolls back the in-memory
//! edit, and never turns a successful mutation into an error.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

use chrono::NaiveDate;
use thiserror::Error;
use tracing::{debug, error, info, instrument, warn};

use super::report::LoanReport;
use crate::core::{SnapshotError, SnapshotStore};
use crate::domain::{Book, BookType, LendError};

/// Errors returned by catalog operations
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Book with ISBN {0} already exists")]
    DuplicateIsbn(String),

    #[error("Book with ISBN {0} not found")]
    NotFound(String),

    #[error("Invalid lend request: {0}")]
    InvalidLendRequest(#[from] LendError),

    #[error("Book {0} has a loan flag that disagrees with its borrower and dates")]
    InconsistentLoan(String),

    #[error("Persistence error: {0}")]
    Persistence(#[from] SnapshotError),
}

/// Catalog of all books
#[derive(Debug)]
pub struct Catalog {
    /// Current snapshot of the collection, swapped whole on every mutation
    books: RwLock<Arc<Vec<Book>>>,

    /// Serializes mutations so no edit or save is lost to a racing writer
    writer: Mutex<()>,

    /// Set when the last save failed and cleared by the next good one
    unsaved: AtomicBool,

    store: SnapshotStore,
}

impl Catalog {
    /// Open the catalog, loading whatever the store holds.
    ///
    /// A corrupt or unreadable snapshot is logged and the catalog starts
    /// empty; it does not fail startup.
    pub fn open(store: SnapshotStore) -> Self {
        let books = match store.load() {
            Ok(books) => {
                info!(count = books.len(), path = %store.path().display(), "Loaded catalog");
                books
            }
            Err(e) => {
                warn!(path = %store.path().display(), "Failed to load catalog, starting empty: {}", e);
                Vec::new()
            }
        };

        Self::with_books(store, books)
    }

    /// Build a catalog around an already-loaded collection
    pub fn with_books(store: SnapshotStore, books: Vec<Book>) -> Self {
        Self {
            books: RwLock::new(Arc::new(books)),
            writer: Mutex::new(()),
            unsaved: AtomicBool::new(false),
            store,
        }
    }

    /// Get the backing store
    pub fn store(&self) -> &SnapshotStore {
        &self.store
    }

    /// Shared view of the current collection
    pub fn snapshot(&self) -> Arc<Vec<Book>> {
        let guard = self.books.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&guard)
    }

    /// Add a new book. It is stored available, with no loan fields.
    #[instrument(skip(self, book), fields(isbn = %book.isbn()))]
    pub fn add(&self, mut book: Book) -> Result<(), CatalogError> {
        book.clear_loan();
        self.mutate(|books| {
            if books.iter().any(|b| b.isbn() == book.isbn()) {
                return Err(CatalogError::DuplicateIsbn(book.isbn().to_string()));
            }
            books.push(book);
            Ok(())
        })?;
        info!("Book added");
        Ok(())
    }

    /// Remove a book by ISBN, returning it
    #[instrument(skip(self))]
    pub fn remove(&self, isbn: &str) -> Result<Book, CatalogError> {
        let removed = self.mutate(|books| {
            let pos = books
                .iter()
                .position(|b| b.isbn() == isbn)
                .ok_or_else(|| CatalogError::NotFound(isbn.to_string()))?;
            Ok(books.remove(pos))
        })?;
        info!("Book removed");
        Ok(removed)
    }

    /// Replace the stored book with the same ISBN, keeping its position.
    /// Books flagged on loan without a borrower and both dates, or carrying
    /// them while available, are refused.
    #[instrument(skip(self, book), fields(isbn = %book.isbn()))]
    pub fn update(&self, book: Book) -> Result<(), CatalogError> {
        if !book.has_consistent_loan() {
            return Err(CatalogError::InconsistentLoan(book.isbn().to_string()));
        }
        self.mutate(|books| {
            let existing = books
                .iter_mut()
                .find(|b| b.isbn() == book.isbn())
                .ok_or_else(|| CatalogError::NotFound(book.isbn().to_string()))?;
            *existing = book;
            Ok(())
        })?;
        info!("Book updated");
        Ok(())
    }

    /// Lend a book, returning its new state
    #[instrument(skip(self))]
    pub fn lend(&self, isbn: &str, borrower: &str, today: NaiveDate) -> Result<Book, CatalogError> {
        let book = self.mutate(|books| {
            let book = find_mut(books, isbn)?;
            book.lend(borrower, today)?;
            Ok(book.clone())
        })?;
        info!(due = ?book.due_date(), "Book lent");
        Ok(book)
    }

    /// Return a loaned book, returning its new state
    #[instrument(skip(self))]
    pub fn return_book(&self, isbn: &str) -> Result<Book, CatalogError> {
        let book = self.mutate(|books| {
            let book = find_mut(books, isbn)?;
            book.return_loan()?;
            Ok(book.clone())
        })?;
        info!("Book returned");
        Ok(book)
    }

    /// Get a book by ISBN
    pub fn find_by_isbn(&self, isbn: &str) -> Option<Book> {
        self.snapshot().iter().find(|b| b.isbn() == isbn).cloned()
    }

    /// Search title, author and ISBN (case-insensitive substring match).
    /// An empty keyword matches every book.
    pub fn search(&self, keyword: &str) -> Vec<Book> {
        let keyword = keyword.to_lowercase();
        self.snapshot()
            .iter()
            .filter(|b| b.matches_lowercase(&keyword))
            .cloned()
            .collect()
    }

    /// Every book, in insertion order
    pub fn list_all(&self) -> Vec<Book> {
        self.snapshot().as_ref().clone()
    }

    /// Filter books by variant
    pub fn filter_by_type(&self, book_type: BookType) -> Vec<Book> {
        self.snapshot()
            .iter()
            .filter(|b| b.book_type() == book_type)
            .cloned()
            .collect()
    }

    /// Books whose due date is before `today`
    pub fn overdue(&self, today: NaiveDate) -> Vec<Book> {
        self.snapshot()
            .iter()
            .filter(|b| b.is_overdue(today))
            .cloned()
            .collect()
    }

    /// Active and overdue loans as of `today`
    pub fn loan_report(&self, today: NaiveDate) -> LoanReport {
        LoanReport::build(&self.snapshot(), today)
    }

    /// Number of books per variant; variants with no books are omitted
    pub fn counts_by_type(&self) -> BTreeMap<BookType, usize> {
        let mut counts = BTreeMap::new();
        for book in self.snapshot().iter() {
            *counts.entry(book.book_type()).or_insert(0) += 1;
        }
        counts
    }

    /// Get the number of books
    pub fn len(&self) -> usize {
        self.snapshot().len()
    }

    /// Check if the catalog is empty
    pub fn is_empty(&self) -> bool {
        self.snapshot().is_empty()
    }

    /// True when the most recent save failed, so disk lags memory
    pub fn has_unsaved_changes(&self) -> bool {
        self.unsaved.load(Ordering::SeqCst)
    }

    /// Write the current state, reporting failure to the caller
    pub fn flush(&self) -> Result<(), CatalogError> {
        let _writer = self.lock_writer();
        let books = self.snapshot();
        self.store.save(&books)?;
        self.unsaved.store(false, Ordering::SeqCst);
        Ok(())
    }

    /// Apply `edit` to a copy of the collection. On success the copy
    /// replaces the current snapshot and is persisted; on error nothing
    /// changes.
    fn mutate<T>(
        &self,
        edit: impl FnOnce(&mut Vec<Book>) -> Result<T, CatalogError>,
    ) -> Result<T, CatalogError> {
        let _writer = self.lock_writer();

        let mut next = self.snapshot().as_ref().clone();
        let result = edit(&mut next)?;
        let next = Arc::new(next);

        {
            let mut current = self.books.write().unwrap_or_else(PoisonError::into_inner);
            *current = Arc::clone(&next);
        }

        self.persist(&next);
        Ok(result)
    }

    /// Save `books`, logging instead of failing
    fn persist(&self, books: &[Book]) {
        match self.store.save(books) {
            Ok(()) => {
                self.unsaved.store(false, Ordering::SeqCst);
                debug!(count = books.len(), "Catalog saved");
            }
            Err(e) => {
                self.unsaved.store(true, Ordering::SeqCst);
                error!(path = %self.store.path().display(), "Failed to save catalog: {}", e);
            }
        }
    }

    fn lock_writer(&self) -> MutexGuard<'_, ()> {
        self.writer.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn find_mut<'a>(books: &'a mut [Book], isbn: &str) -> Result<&'a mut Book, CatalogError> {
    books
        .iter_mut()
        .find(|b| b.isbn() == isbn)
        .ok_or_else(|| CatalogError::NotFound(isbn.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn test_catalog() -> (Catalog, TempDir) {
        let temp = TempDir::new().unwrap();
        let store = SnapshotStore::new(temp.path().join("books.json"));
        (Catalog::open(store), temp)
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_catalog_add_and_get() {
        let (catalog, _temp) = test_catalog();
        catalog
            .add(Book::fiction("A1", "Foo", "X", 2000, "Thriller"))
            .unwrap();

        assert_eq!(catalog.len(), 1);
        let book = catalog.find_by_isbn("A1").unwrap();
        assert_eq!(book.book_type().as_str(), "Fiction");
        assert_eq!(book.details(), "Genre: Thriller");
        assert!(catalog.find_by_isbn("missing").is_none());
    }

    #[test]
    fn test_add_normalizes_loan_state() {
        let (catalog, _temp) = test_catalog();
        let mut book = Book::fiction("A1", "Foo", "X", 2000, "Thriller");
        book.lend("Alice", date(2024, 1, 1)).unwrap();

        catalog.add(book).unwrap();
        let stored = catalog.find_by_isbn("A1").unwrap();
        assert!(!stored.is_on_loan());
        assert!(stored.borrower().is_none());
    }

    #[test]
    fn test_catalog_search() {
        let (catalog, _temp) = test_catalog();
        catalog
            .add(Book::fiction("111", "The Hobbit", "Tolkien", 1937, "Fantasy"))
            .unwrap();
        catalog
            .add(Book::fiction("222", "Dune", "Herbert", 1965, "Sci-Fi"))
            .unwrap();

        let results = catalog.search("hob");
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].isbn(), "111");

        // Case insensitive
        let results = catalog.search("HOBBIT");
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].isbn(), "111");

        // Empty keyword matches everything
        assert_eq!(catalog.search("").len(), 2);

        // By author and ISBN
        assert_eq!(catalog.search("herb").len(), 1);
        assert_eq!(catalog.search("22").len(), 1);

        // No match
        assert!(catalog.search("python").is_empty());
    }

    #[test]
    fn test_catalog_filter_and_counts_by_type() {
        let (catalog, _temp) = test_catalog();
        catalog
            .add(Book::fiction("1", "A", "X", 2001, "Drama"))
            .unwrap();
        catalog
            .add(Book::fiction("2", "B", "X", 2002, "Drama"))
            .unwrap();
        catalog
            .add(Book::reference("3", "C", "Y", 2003, "Atlas"))
            .unwrap();

        assert_eq!(catalog.filter_by_type(BookType::Fiction).len(), 2);
        assert!(catalog.filter_by_type(BookType::NonFiction).is_empty());

        let counts = catalog.counts_by_type();
        assert_eq!(counts.get(&BookType::Fiction), Some(&2));
        assert_eq!(counts.get(&BookType::Reference), Some(&1));
        assert_eq!(counts.get(&BookType::NonFiction), None);
    }

    #[test]
    fn test_catalog_remove() {
        let (catalog, _temp) = test_catalog();
        catalog
            .add(Book::fiction("A1", "Foo", "X", 2000, "Thriller"))
            .unwrap();

        let removed = catalog.remove("A1").unwrap();
        assert_eq!(removed.isbn(), "A1");
        assert!(catalog.is_empty());

        assert!(matches!(
            catalog.remove("A1"),
            Err(CatalogError::NotFound(isbn)) if isbn == "A1"
        ));
    }

    #[test]
    fn test_snapshot_is_unaffected_by_later_mutation() {
        let (catalog, _temp) = test_catalog();
        catalog
            .add(Book::fiction("1", "A", "X", 2001, "Drama"))
            .unwrap();

        let before = catalog.snapshot();
        catalog
            .add(Book::fiction("2", "B", "X", 2002, "Drama"))
            .unwrap();

        assert_eq!(before.len(), 1);
        assert_eq!(catalog.snapshot().len(), 2);
    }

    #[test]
    fn test_failed_edit_leaves_collection_untouched() {
        let (catalog, _temp) = test_catalog();
        catalog
            .add(Book::reference("R1", "Atlas", "Various", 2010, "Maps"))
            .unwrap();
        let before = catalog.snapshot();

        let err = catalog.lend("R1", "Alice", date(2024, 1, 1)).unwrap_err();
        assert!(matches!(
            err,
            CatalogError::InvalidLendRequest(LendError::NotLendable(_))
        ));
        assert!(Arc::ptr_eq(&before, &catalog.snapshot()));
    }
}
