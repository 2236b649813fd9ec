//! `tsettings` schema. The layout matches what the simulator's own trust
//! evaluation reads, so names and keys must not change.

use rusqlite::{Connection, OptionalExtension};

use super::error::{Result, TrustStoreError};

pub const TABLE: &str = "tsettings";

const CREATE: &str = "
    CREATE TABLE tsettings (
        sha1 BLOB NOT NULL DEFAULT '',
        subj BLOB NOT NULL DEFAULT '',
        tset BLOB,
        data BLOB,
        PRIMARY KEY(sha1)
    );
    CREATE INDEX isubj ON tsettings(subj);
";

/// Whether the `tsettings` table is present.
pub fn table_exists(conn: &Connection) -> rusqlite::Result<bool> {
    conn.query_row(
        "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1",
        [TABLE],
        |_| Ok(()),
    )
    .optional()
    .map(|found| found.is_some())
}

/// Create table and index in a single transaction.
pub fn create(conn: &mut Connection) -> Result<()> {
    let tx = conn.transaction().map_err(TrustStoreError::SchemaCreation)?;
    tx.execute_batch(CREATE)
        .map_err(TrustStoreError::SchemaCreation)?;
    tx.commit().map_err(TrustStoreError::SchemaCreation)?;
    tracing::debug!("created {TABLE} schema");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_adds_table_and_index() {
        let mut conn = Connection::open_in_memory().unwrap();
        assert!(!table_exists(&conn).unwrap());

        create(&mut conn).unwrap();
        assert!(table_exists(&conn).unwrap());

        let index: String = conn
            .query_row(
                "SELECT name FROM sqlite_master WHERE type = 'index' AND tbl_name = 'tsettings' AND name = 'isubj'",
                [],
                |r| r.get(0),
            )
            .unwrap();
        assert_eq!(index, "isubj");
    }

    #[test]
    fn create_twice_fails_without_partial_state() {
        let mut conn = Connection::open_in_memory().unwrap();
        create(&mut conn).unwrap();
        let err = create(&mut conn).unwrap_err();
        assert!(matches!(err, TrustStoreError::SchemaCreation(_)));
        assert!(table_exists(&conn).unwrap());
    }
}
