//! Parsed X.509 certificates and digest helpers.

use anyhow::{Context, Result};
use base64::prelude::{Engine as _, BASE64_STANDARD};
use sha1::{Digest, Sha1};
use std::fs;
use std::path::Path;
use x509_parser::error::X509Error;
use x509_parser::prelude::{FromDer, X509Certificate};

/// Error produced when bytes do not hold a single well-formed certificate.
pub type ParseError = x509_parser::nom::Err<X509Error>;

/// Length of a SHA-1 digest in bytes.
pub const DIGEST_LEN: usize = 20;

/// SHA-1 digest of a byte buffer.
pub fn digest(bytes: &[u8]) -> [u8; DIGEST_LEN] {
    Sha1::digest(bytes).into()
}

/// An immutable, successfully parsed certificate.
///
/// Only the DER bytes and the fields the trust store needs are kept, so the
/// value owns its data and does not borrow from a parser buffer.
#[derive(Debug, Clone)]
pub struct Certificate {
    der: Vec<u8>,
    subject_der: Vec<u8>,
    subject_summary: Option<String>,
    not_after: time::OffsetDateTime,
}

impl PartialEq for Certificate {
    fn eq(&self, other: &Self) -> bool {
        self.der == other.der
    }
}

impl Eq for Certificate {}

impl Certificate {
    /// Parse DER bytes. Trailing garbage after the certificate is rejected.
    pub fn from_der(der: &[u8]) -> Result<Self, ParseError> {
        let (rest, x509) = X509Certificate::from_der(der)?;
        if !rest.is_empty() {
            return Err(x509_parser::nom::Err::Error(X509Error::InvalidCertificate));
        }

        let subject = x509.subject();
        let subject_summary = subject
            .iter_common_name()
            .next()
            .and_then(|cn| cn.as_str().ok())
            .map(String::from)
            .or_else(|| {
                let full = subject.to_string();
                (!full.is_empty()).then_some(full)
            });

        let not_after = x509.validity().not_after.to_datetime();

        Ok(Self {
            der: der.to_vec(),
            subject_der: subject.as_raw().to_vec(),
            subject_summary,
            not_after,
        })
    }

    /// Load a certificate file. PEM files use their first CERTIFICATE block;
    /// anything else is treated as raw DER.
    pub fn load(path: &Path) -> Result<Self> {
        let bytes =
            fs::read(path).with_context(|| format!("read certificate: {}", path.display()))?;

        let pem = rustls_pemfile::certs(&mut bytes.as_slice())
            .next()
            .transpose()
            .with_context(|| format!("parse PEM: {}", path.display()))?
            .map(|der| der.to_vec());
        let der = pem.unwrap_or(bytes);

        Self::from_der(&der)
            .map_err(|e| anyhow::anyhow!("parse X.509 in {}: {e}", path.display()))
    }

    /// The DER encoding this certificate was parsed from.
    pub fn der(&self) -> &[u8] {
        &self.der
    }

    /// DER encoding of the subject Name.
    pub fn subject_der(&self) -> &[u8] {
        &self.subject_der
    }

    /// Common Name, or the full subject when no CN is present.
    pub fn subject_summary(&self) -> Option<&str> {
        self.subject_summary.as_deref()
    }

    /// PEM encoding with 64-column base64 lines.
    pub fn to_pem(&self) -> String {
        let b64 = BASE64_STANDARD.encode(&self.der);
        let mut pem = String::from("-----BEGIN CERTIFICATE-----\n");
        for line in b64.as_bytes().chunks(64) {
            pem.push_str(&String::from_utf8_lossy(line));
            pem.push('\n');
        }
        pem.push_str("-----END CERTIFICATE-----\n");
        pem
    }

    pub fn not_after(&self) -> time::OffsetDateTime {
        self.not_after
    }

    pub fn sha1(&self) -> [u8; DIGEST_LEN] {
        digest(&self.der)
    }
}
