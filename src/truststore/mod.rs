//! Per-device simulator trust stores (`TrustStore.sqlite3`).

mod connection;
mod error;
mod row;
pub mod schema;

use std::fs;
use std::path::{Path, PathBuf};

pub use connection::Connection;
pub use error::{Result, TrustStoreError};
pub use row::TrustStoreRow;

/// Location of a device's trust store relative to its device directory.
pub const TRUST_STORE_RELATIVE_PATH: &str = "data/Library/Keychains/TrustStore.sqlite3";

/// Path of the trust store for the device `udid` under `devices_dir`.
pub fn trust_store_path(devices_dir: &Path, udid: &str) -> PathBuf {
    devices_dir.join(udid).join(TRUST_STORE_RELATIVE_PATH)
}

/// One device's trust store. Holds no connection; see [`TrustStore::open`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrustStore {
    pub udid: String,
    pub path: PathBuf,
}

impl TrustStore {
    pub fn new(devices_dir: &Path, udid: &str) -> Self {
        Self {
            udid: udid.to_string(),
            path: trust_store_path(devices_dir, udid),
        }
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    pub fn create_parent_directories(&self) -> std::io::Result<()> {
        match self.path.parent() {
            Some(p) => fs::create_dir_all(p),
            None => Ok(()),
        }
    }

    pub fn open(&self) -> Result<Connection> {
        Connection::open(&self.path)
    }
}
