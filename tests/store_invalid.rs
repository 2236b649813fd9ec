//! Stores that exist but are not usable trust stores.

mod common;

use simtrust::truststore::{Connection, TrustStoreError};

#[test]
fn database_without_table_is_invalid() {
    let dir = common::temp_home();
    let path = dir.path().join("ts.sqlite3");
    {
        let conn = rusqlite::Connection::open(&path).unwrap();
        conn.execute_batch("CREATE TABLE other (x INTEGER);").unwrap();
    }
    let conn = Connection::open(&path).unwrap();
    assert!(!conn.needs_creation());
    assert!(!conn.is_valid());
}

#[test]
fn non_database_file_is_invalid_not_error() {
    let dir = common::temp_home();
    let path = dir.path().join("ts.sqlite3");
    std::fs::write(&path, vec![0xAB; 4096]).unwrap();

    let conn = Connection::open(&path).unwrap();
    assert!(!conn.is_valid());
}

#[test]
fn open_in_missing_directory_fails() {
    let dir = common::temp_home();
    let path = dir.path().join("missing").join("ts.sqlite3");
    assert!(matches!(
        Connection::open(&path),
        Err(TrustStoreError::Open { .. })
    ));
}
