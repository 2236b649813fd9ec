//! Shared test helpers.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Create a temp directory for use as SIMTRUST_HOME / devices dir.
pub fn temp_home() -> TempDir {
    tempfile::Builder::new()
        .prefix("simtrust_test_")
        .tempdir()
        .expect("temp dir")
}

/// Self-signed CA certificate with the given Common Name: (DER, PEM).
pub fn make_ca(common_name: &str) -> (Vec<u8>, String) {
    let key = rcgen::KeyPair::generate().expect("key pair");
    let mut params = rcgen::CertificateParams::new(Vec::<String>::new()).expect("params");
    params.distinguished_name = rcgen::DistinguishedName::new();
    params.distinguished_name.push(
        rcgen::DnType::CommonName,
        rcgen::DnValue::Utf8String(common_name.to_string()),
    );
    params.is_ca = rcgen::IsCa::Ca(rcgen::BasicConstraints::Unconstrained);
    let cert = params.self_signed(&key).expect("self signed");
    (cert.der().to_vec(), cert.pem())
}

pub fn make_certificate(common_name: &str) -> simtrust::cert::Certificate {
    let (der, _) = make_ca(common_name);
    simtrust::cert::Certificate::from_der(&der).expect("parse generated cert")
}

/// Write a PEM file for a fresh CA and return its path.
pub fn write_ca_pem(dir: &Path, common_name: &str) -> PathBuf {
    let (_, pem) = make_ca(common_name);
    let path = dir.join(format!("{}.pem", common_name.replace(' ', "_")));
    std::fs::write(&path, pem).expect("write pem");
    path
}

/// Write a simctl-style device listing. Each entry is (runtime, name, udid, state).
pub fn write_device_listing(dir: &Path, devices: &[(&str, &str, &str, &str)]) -> PathBuf {
    let mut by_runtime = serde_json::Map::new();
    for (runtime, name, udid, state) in devices {
        let entry = by_runtime
            .entry(runtime.to_string())
            .or_insert_with(|| serde_json::Value::Array(Vec::new()));
        if let serde_json::Value::Array(list) = entry {
            list.push(serde_json::json!({
                "name": name,
                "udid": udid,
                "state": state,
                "isAvailable": true,
            }));
        }
    }
    let json = serde_json::json!({ "devices": by_runtime });
    let path = dir.join("devices.json");
    std::fs::write(&path, serde_json::to_string_pretty(&json).unwrap()).expect("write listing");
    path
}

/// Insert a raw row, bypassing the codec.
pub fn insert_raw_row(path: &Path, sha1: &[u8], data: Option<&[u8]>) {
    let conn = rusqlite::Connection::open(path).expect("open");
    conn.execute(
        "INSERT INTO tsettings (sha1, subj, tset, data) VALUES (?1, x'', NULL, ?2)",
        rusqlite::params![sha1, data],
    )
    .expect("insert raw row");
}
