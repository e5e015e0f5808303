//! Store Invariant Tests
//!
//! Tests for record and schema invariants:
//! - The primary key is immutable once stored
//! - Every stored row covers the schema exactly
//! - A duplicate add never modifies the existing row
//! - The on-disk header must match an established schema
//! - A failed read never corrupts the cache

use pipedb::{Fields, Schema, Store, StoreErrorCode};
use serde_json::json;
use std::fs;
use std::thread;
use std::time::Duration;
use tempfile::TempDir;

// =============================================================================
// Test Utilities
// =============================================================================

fn schema() -> Schema {
    Schema::new(["id", "name", "active"]).unwrap()
}

fn open_with_rows(dir: &TempDir, keys: &[&str]) -> Store {
    let store = Store::open(dir.path().join("t.db"), Some(schema())).unwrap();
    for key in keys {
        store
            .add(Fields::positional([*key, "name"]).push(true))
            .unwrap();
    }
    store
}

/// Lets the file's mtime advance past a previous write
fn tick() {
    thread::sleep(Duration::from_millis(50));
}

// =============================================================================
// Primary-Key Immutability
// =============================================================================

#[test]
fn test_primary_key_is_read_only_for_every_record() {
    let dir = TempDir::new().unwrap();
    let store = open_with_rows(&dir, &["1", "2", "3"]);

    for record in store.values().unwrap() {
        let before = record.key().clone();
        for attempt in [json!("other"), before.clone(), json!(null)] {
            let err = record.set("id", attempt).unwrap_err();
            assert_eq!(err.code(), StoreErrorCode::ReadOnlyField);
        }
        assert_eq!(record.get("id").unwrap(), before);
    }
    assert_eq!(store.metrics().skipped_writes, 0);
}

#[test]
fn test_primary_key_read_only_on_reopened_store() {
    let dir = TempDir::new().unwrap();
    open_with_rows(&dir, &["1"]);

    let reopened = Store::open(dir.path().join("t.db"), None).unwrap();
    let err = reopened.record("1").unwrap().set("id", "9").unwrap_err();
    assert_eq!(err.code(), StoreErrorCode::ReadOnlyField);
}

// =============================================================================
// Schema Enforcement
// =============================================================================

#[test]
fn test_set_with_missing_field_fails() {
    let dir = TempDir::new().unwrap();
    let store = open_with_rows(&dir, &[]);

    let err = store
        .set("1", Fields::new().with("name", "only"))
        .unwrap_err();
    assert_eq!(err.code(), StoreErrorCode::HeadersMismatch);
    assert!(store.is_empty().unwrap());
}

#[test]
fn test_set_with_extra_field_fails() {
    let dir = TempDir::new().unwrap();
    let store = open_with_rows(&dir, &[]);

    let err = store
        .set(
            "1",
            Fields::new()
                .with("name", "a")
                .with("active", true)
                .with("email", "a@example.com"),
        )
        .unwrap_err();
    assert_eq!(err.code(), StoreErrorCode::HeadersMismatch);

    let err = store
        .set(
            "1",
            Fields::positional([json!("1"), json!("a"), json!(true), json!("extra")]),
        )
        .unwrap_err();
    assert_eq!(err.code(), StoreErrorCode::HeadersMismatch);
    assert!(store.is_empty().unwrap());
}

#[test]
fn test_unknown_field_access_fails() {
    let dir = TempDir::new().unwrap();
    let store = open_with_rows(&dir, &["1"]);
    let record = store.record("1").unwrap();

    assert_eq!(
        record.get("email").unwrap_err().code(),
        StoreErrorCode::UnknownField
    );
    assert_eq!(
        record.set("email", "x").unwrap_err().code(),
        StoreErrorCode::UnknownField
    );
    assert_eq!(
        record.delete("name").unwrap_err().code(),
        StoreErrorCode::Unsupported
    );
    assert_eq!(record.get("name").unwrap(), json!("name"));
}

// =============================================================================
// Duplicate Insert Rejection
// =============================================================================

#[test]
fn test_duplicate_add_leaves_first_row_untouched() {
    let dir = TempDir::new().unwrap();
    let store = open_with_rows(&dir, &[]);
    store
        .add(Fields::positional(["1"]).with("name", "alice").with("active", true))
        .unwrap();
    let before = fs::read_to_string(store.path()).unwrap();

    let err = store
        .add(Fields::positional(["1"]).with("name", "mallory").with("active", false))
        .unwrap_err();
    assert_eq!(err.code(), StoreErrorCode::KeyExists);

    let record = store.record("1").unwrap();
    assert_eq!(record.get("name").unwrap(), json!("alice"));
    assert_eq!(record.get("active").unwrap(), json!(true));
    assert_eq!(fs::read_to_string(store.path()).unwrap(), before);
}

// =============================================================================
// Header Agreement
// =============================================================================

#[test]
fn test_opening_missing_file_without_schema_fails() {
    let dir = TempDir::new().unwrap();
    let err = Store::open(dir.path().join("absent.db"), None).unwrap_err();
    assert_eq!(err.code(), StoreErrorCode::HeadersMissing);
}

#[test]
fn test_reordered_header_is_a_mismatch() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("t.db");
    fs::write(&path, "name|id|active\n-+-+-\n").unwrap();

    let err = Store::open(&path, Some(schema())).unwrap_err();
    assert_eq!(err.code(), StoreErrorCode::HeadersMismatch);
}

#[test]
fn test_header_changed_under_open_store_is_a_mismatch() {
    let dir = TempDir::new().unwrap();
    let store = open_with_rows(&dir, &["1"]);
    tick();
    fs::write(store.path(), "id|name\n-+-\n\"1\"|\"x\"\n").unwrap();

    let err = store.read().unwrap_err();
    assert_eq!(err.code(), StoreErrorCode::HeadersMismatch);
}

// =============================================================================
// Failed Reads Keep the Cache
// =============================================================================

#[test]
fn test_partial_parse_failure_keeps_previous_cache() {
    let dir = TempDir::new().unwrap();
    let store = open_with_rows(&dir, &["1", "2"]);
    let record = store.record("2").unwrap();
    tick();

    // First row decodes, second does not
    fs::write(
        store.path(),
        "id|name|active\n-+-+-\n\"1\"|\"new\"|true\n\"3\"|unquoted|true\n",
    )
    .unwrap();

    let err = store.read().unwrap_err();
    assert_eq!(err.code(), StoreErrorCode::Corruption);
    assert_eq!(
        record.to_string(),
        r#"Record(id="2", name="name", active=true)"#
    );

    // Repairing the file makes the next read succeed
    tick();
    fs::write(store.path(), "id|name|active\n-+-+-\n\"1\"|\"new\"|true\n").unwrap();
    assert!(store.read().unwrap());
    assert_eq!(store.keys().unwrap(), vec![json!("1")]);
}

#[test]
fn test_duplicate_keys_in_file_are_rejected() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("t.db");
    fs::write(&path, "id|name\n-+-\n\"1\"|\"a\"\n\"1\"|\"b\"\n").unwrap();

    let err = Store::open(&path, None).unwrap_err();
    assert_eq!(err.code(), StoreErrorCode::Corruption);
}

#[test]
fn test_deleted_file_surfaces_io_error() {
    let dir = TempDir::new().unwrap();
    let store = open_with_rows(&dir, &["1"]);
    fs::remove_file(store.path()).unwrap();

    let err = store.len().unwrap_err();
    assert_eq!(err.code(), StoreErrorCode::Io);
    assert_eq!(
        err.io_source().map(std::io::Error::kind),
        Some(std::io::ErrorKind::NotFound)
    );
}
