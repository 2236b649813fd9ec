//! On-disk `tsettings` record and its mapping to and from certificates.

use rusqlite::types::ValueRef;

use super::error::{Result, TrustStoreError};
use crate::cert::{self, Certificate};

/// One row of the `tsettings` table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrustStoreRow {
    /// SHA-1 of the certificate DER; primary key.
    pub sha1: Vec<u8>,
    /// DER encoding of the certificate subject.
    pub subj: Vec<u8>,
    /// Opaque trust-settings blob. `None` means default trust.
    pub tset: Option<Vec<u8>>,
    /// Raw certificate. `None` for trust-settings-only rows.
    pub data: Option<Vec<u8>>,
    /// SQLite rowid when the row was read from a store.
    pub rowid: Option<i64>,
}

impl TrustStoreRow {
    /// Encode a certificate as a row. Trust settings are never synthesized.
    pub fn encode(certificate: &Certificate) -> Result<Self> {
        let der = certificate.der();
        if der.is_empty() {
            return Err(TrustStoreError::Encoding);
        }
        Ok(Self {
            sha1: cert::digest(der).to_vec(),
            subj: certificate.subject_der().to_vec(),
            tset: None,
            data: Some(der.to_vec()),
            rowid: None,
        })
    }

    /// Parse the embedded certificate. Only called on demand so that one bad
    /// row never stops enumeration of the others.
    pub fn validated_certificate(&self) -> Result<Certificate> {
        let data = self.data.as_deref().ok_or(TrustStoreError::MissingData)?;
        Certificate::from_der(data)
            .map_err(|e| TrustStoreError::MalformedCertificate(e.to_string()))
    }

    pub fn sha1_hex(&self) -> String {
        hex::encode(&self.sha1)
    }

    /// Read a row selected as `rowid, sha1, subj, tset, data`.
    pub(crate) fn from_sql(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            rowid: Some(row.get(0)?),
            sha1: bytes_column(row, 1)?.unwrap_or_default(),
            subj: bytes_column(row, 2)?.unwrap_or_default(),
            tset: bytes_column(row, 3)?,
            data: bytes_column(row, 4)?,
        })
    }
}

/// Stores written by the OS are not strict about column types: the schema
/// defaults `sha1`/`subj` to the text `''`. Accept blob or text, map NULL to None.
/// The bytes lose the SQLite type, so deletes of read rows go through `rowid`.
fn bytes_column(row: &rusqlite::Row<'_>, idx: usize) -> rusqlite::Result<Option<Vec<u8>>> {
    Ok(match row.get_ref(idx)? {
        ValueRef::Null => None,
        ValueRef::Blob(b) | ValueRef::Text(b) => Some(b.to_vec()),
        ValueRef::Integer(i) => Some(i.to_string().into_bytes()),
        ValueRef::Real(f) => Some(f.to_string().into_bytes()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row_with_data(data: Option<Vec<u8>>) -> TrustStoreRow {
        TrustStoreRow {
            sha1: vec![0; cert::DIGEST_LEN],
            subj: Vec::new(),
            tset: None,
            data,
            rowid: None,
        }
    }

    #[test]
    fn missing_data_is_reported() {
        let err = row_with_data(None).validated_certificate().unwrap_err();
        assert!(matches!(err, TrustStoreError::MissingData));
    }

    #[test]
    fn garbage_data_is_malformed() {
        let err = row_with_data(Some(b"garbage".to_vec()))
            .validated_certificate()
            .unwrap_err();
        assert!(matches!(err, TrustStoreError::MalformedCertificate(_)));
    }
}
