//! Live handle to one trust store file.

use rusqlite::{params, OptionalExtension};
use std::path::{Path, PathBuf};

use super::error::{Result, TrustStoreError};
use super::row::TrustStoreRow;
use super::schema;
use crate::cert::Certificate;

/// An open trust store. The file handle is released when this is dropped.
pub struct Connection {
    conn: rusqlite::Connection,
    path: PathBuf,
    needs_creation: bool,
}

impl Connection {
    /// Open the store at `path`, creating an empty file if absent.
    pub fn open(path: &Path) -> Result<Self> {
        // Must be checked before opening: SQLite creates the file on open.
        let needs_creation = !path.exists();
        let conn = rusqlite::Connection::open(path).map_err(|source| TrustStoreError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!(path = %path.display(), needs_creation, "opened trust store");
        Ok(Self {
            conn,
            path: path.to_path_buf(),
            needs_creation,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// True when the file did not exist at open time and the schema has not
    /// been created yet.
    pub fn needs_creation(&self) -> bool {
        self.needs_creation
    }

    /// Create the schema if this connection created the file. No-op otherwise.
    pub fn setup_database_if_needed(&mut self) -> Result<()> {
        if !self.needs_creation {
            return Ok(());
        }
        schema::create(&mut self.conn)?;
        self.needs_creation = false;
        Ok(())
    }

    /// Whether the store has a `tsettings` table. Query failures count as invalid.
    pub fn is_valid(&self) -> bool {
        match schema::table_exists(&self.conn) {
            Ok(exists) => exists,
            Err(e) => {
                tracing::debug!(path = %self.path.display(), error = %e, "trust store unreadable");
                false
            }
        }
    }

    /// All rows in storage order. Certificates are not parsed here.
    pub fn rows(&self) -> Result<Vec<TrustStoreRow>> {
        let mut stmt = self
            .conn
            .prepare("SELECT rowid, sha1, subj, tset, data FROM tsettings")?;
        let rows = stmt
            .query_map([], TrustStoreRow::from_sql)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    pub fn has_certificate(&self, sha1: &[u8]) -> Result<bool> {
        let found = self
            .conn
            .query_row(
                "SELECT 1 FROM tsettings WHERE sha1 = ?1",
                params![sha1],
                |_| Ok(()),
            )
            .optional()?;
        Ok(found.is_some())
    }

    /// Insert a certificate. Fails with `DuplicateKey` if its digest is present.
    pub fn add_certificate(&self, certificate: &Certificate) -> Result<()> {
        let row = TrustStoreRow::encode(certificate)?;
        self.conn
            .execute(
                "INSERT INTO tsettings (sha1, subj, tset, data) VALUES (?1, ?2, ?3, ?4)",
                params![row.sha1, row.subj, row.tset, row.data],
            )
            .map_err(|e| TrustStoreError::from_insert(e, &row.sha1))?;
        tracing::debug!(sha1 = %row.sha1_hex(), path = %self.path.display(), "added certificate");
        Ok(())
    }

    /// Delete a row previously returned by [`Connection::rows`]. Uses the
    /// rowid so keys stored as text or integers are matched too. Returns
    /// whether a row was deleted.
    pub fn remove_row(&self, row: &TrustStoreRow) -> Result<bool> {
        let n = match row.rowid {
            Some(rowid) => self
                .conn
                .execute("DELETE FROM tsettings WHERE rowid = ?1", params![rowid])?,
            None => self
                .conn
                .execute("DELETE FROM tsettings WHERE sha1 = ?1", params![row.sha1])?,
        };
        tracing::debug!(sha1 = %row.sha1_hex(), removed = n, "removed row");
        Ok(n > 0)
    }

    /// Delete by primary key. Deleting an absent key is not an error.
    pub fn remove_certificate(&self, sha1: &[u8]) -> Result<()> {
        let n = self
            .conn
            .execute("DELETE FROM tsettings WHERE sha1 = ?1", params![sha1])?;
        tracing::debug!(sha1 = %hex::encode(sha1), removed = n, "removed certificate");
        Ok(())
    }
}
