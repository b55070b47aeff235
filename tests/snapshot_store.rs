//! Snapshot Store Integration Tests
//!
//! Tests for the on-disk record format, round-trip fidelity and tolerance
//! of missing or corrupt snapshot files.

use bookshelf::{Book, Catalog, SnapshotError, SnapshotStore};
use chrono::NaiveDate;
use tempfile::TempDir;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[test]
fn test_round_trip_mixed_catalog() {
    let temp = TempDir::new().unwrap();
    let store = SnapshotStore::new(temp.path().join("books.json"));

    let mut lent = Book::fiction("F1", "The Hobbit", "Tolkien", 1937, "Fantasy");
    lent.lend("Alice", date(2024, 1, 1)).unwrap();
    let books = vec![
        Book::reference("R1", "Oxford Atlas", "Various", 2010, "Maps"),
        lent,
        Book::non_fiction("N1", "Cosmos", "Sagan", 1980, "Astronomy"),
        Book::fiction("F2", "Dune, \"Deluxe\"", "Herbert", 1965, "Sci-Fi"),
    ];

    store.save(&books).unwrap();
    assert_eq!(store.load().unwrap(), books);
}

#[test]
fn test_round_trip_after_loan_changes_through_update() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("books.json");
    let catalog = Catalog::open(SnapshotStore::new(&path));

    catalog
        .add(Book::fiction("F1", "The Hobbit", "Tolkien", 1937, "Fantasy"))
        .unwrap();
    catalog
        .add(Book::non_fiction("N1", "Cosmos", "Sagan", 1980, "Astronomy"))
        .unwrap();
    catalog.lend("F1", "Alice", date(2024, 1, 1)).unwrap();
    catalog.lend("N1", "Bob", date(2024, 1, 2)).unwrap();

    let mut returned = catalog.find_by_isbn("N1").unwrap();
    returned.set_on_loan(false);
    catalog.update(returned).unwrap();

    let mut renamed = catalog.find_by_isbn("F1").unwrap();
    renamed.title = "The Hobbit (Annotated)".to_string();
    catalog.update(renamed).unwrap();

    let books = catalog.list_all();
    assert_eq!(SnapshotStore::new(&path).load().unwrap(), books);
    assert!(books[0].is_on_loan());
    assert!(!books[1].is_on_loan());
}

#[test]
fn test_snapshot_json_shape() {
    let temp = TempDir::new().unwrap();
    let store = SnapshotStore::new(temp.path().join("books.json"));

    let mut book = Book::non_fiction("N1", "Cosmos", "Sagan", 1980, "Astronomy");
    book.lend("Bob", date(2024, 1, 1)).unwrap();
    store
        .save(&[book, Book::reference("R1", "Atlas", "Various", 2010, "Maps")])
        .unwrap();

    let raw = std::fs::read_to_string(store.path()).unwrap();
    let json: serde_json::Value = serde_json::from_str(&raw).unwrap();

    assert_eq!(json["version"], 1);
    let records = json["books"].as_array().unwrap();
    assert_eq!(records.len(), 2);

    assert_eq!(records[0]["type"], "Non-Fiction");
    assert_eq!(records[0]["isbn"], "N1");
    assert_eq!(records[0]["publication_year"], 1980);
    assert_eq!(records[0]["detail"], "Astronomy");
    assert_eq!(records[0]["on_loan"], true);
    assert_eq!(records[0]["borrower"], "Bob");
    assert_eq!(records[0]["due_date"], "2024-01-15");

    assert_eq!(records[1]["type"], "Reference");
    assert_eq!(records[1]["on_loan"], false);
    assert!(records[1]["borrower"].is_null());
    assert!(records[1]["loan_date"].is_null());
}

#[test]
fn test_load_hand_written_snapshot() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("books.json");
    std::fs::write(
        &path,
        r#"{
  "books": [
    {
      "type": "Fiction",
      "isbn": "A1",
      "title": "Foo",
      "author": "X",
      "publication_year": 2000,
      "detail": "Thriller"
    }
  ]
}"#,
    )
    .unwrap();

    let books = SnapshotStore::new(&path).load().unwrap();
    assert_eq!(books.len(), 1);
    assert_eq!(books[0].details(), "Genre: Thriller");
    assert!(!books[0].is_on_loan());
}

#[test]
fn test_unknown_type_tag_is_corrupt() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("books.json");
    std::fs::write(
        &path,
        r#"{"books": [{"type": "Poetry", "isbn": "P1", "title": "T", "author": "A", "publication_year": 1, "detail": "d"}]}"#,
    )
    .unwrap();

    let result = SnapshotStore::new(&path).load();
    assert!(matches!(result, Err(SnapshotError::Corrupt { .. })));
}

#[test]
fn test_save_creates_parent_directories() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("nested").join("dir").join("books.json");
    let store = SnapshotStore::new(&path);

    store
        .save(&[Book::fiction("A1", "Foo", "X", 2000, "Thriller")])
        .unwrap();
    assert!(path.exists());
    assert_eq!(store.load().unwrap().len(), 1);
}

#[test]
fn test_save_into_unwritable_location_fails() {
    let temp = TempDir::new().unwrap();
    let blocker = temp.path().join("blocker");
    std::fs::write(&blocker, "file, not dir").unwrap();

    let store = SnapshotStore::new(blocker.join("books.json"));
    let result = store.save(&[Book::fiction("A1", "Foo", "X", 2000, "Thriller")]);
    assert!(matches!(result, Err(SnapshotError::Io { .. })));
}
