//! Trust store error types.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TrustStoreError {
    #[error("cannot open trust store at {}: {source}", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    #[error("cannot create trust store schema: {0}")]
    SchemaCreation(#[source] rusqlite::Error),

    #[error("certificate {} is already in the trust store", hex::encode(.0))]
    DuplicateKey(Vec<u8>),

    #[error("row has no certificate data")]
    MissingData,

    #[error("malformed certificate: {0}")]
    MalformedCertificate(String),

    #[error("certificate has no DER encoding")]
    Encoding,

    #[error("trust store error: {0}")]
    Storage(#[from] rusqlite::Error),
}

impl TrustStoreError {
    /// Map an insert failure, turning primary-key violations into `DuplicateKey`.
    pub(crate) fn from_insert(err: rusqlite::Error, sha1: &[u8]) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(e, _)
                if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY =>
            {
                TrustStoreError::DuplicateKey(sha1.to_vec())
            }
            _ => TrustStoreError::Storage(err),
        }
    }
}

pub type Result<T, E = TrustStoreError> = std::result::Result<T, E>;
