//! Simulator device enumeration via `xcrun simctl`.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::Command;

const RUNTIME_PREFIX: &str = "com.apple.CoreSimulator.SimRuntime.";

/// Power state as reported by simctl.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
pub enum DeviceState {
    #[serde(alias = "booted")]
    Booted,
    #[serde(alias = "shutdown")]
    Shutdown,
    #[serde(alias = "booting")]
    Booting,
    #[serde(rename = "Shutting Down", alias = "shutting-down")]
    ShuttingDown,
    #[serde(alias = "creating")]
    Creating,
    #[serde(other)]
    #[value(skip)]
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Device {
    pub name: String,
    pub udid: String,
    pub state: DeviceState,
    #[serde(default = "default_available")]
    pub is_available: bool,
    /// Runtime identifier; filled in from the enclosing group.
    #[serde(default)]
    pub runtime: String,
}

fn default_available() -> bool {
    true
}

/// Output of `simctl list devices --json`: runtime identifier -> devices.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeviceList {
    pub devices: BTreeMap<String, Vec<Device>>,
}

impl DeviceList {
    /// Parse simctl JSON and stamp each device with its runtime.
    pub fn from_json(json: &str) -> Result<Self> {
        let mut list: DeviceList =
            serde_json::from_str(json).context("parse simctl device list")?;
        for (runtime, devices) in list.devices.iter_mut() {
            for d in devices.iter_mut() {
                d.runtime = runtime.clone();
            }
        }
        Ok(list)
    }

    /// All devices, ignoring runtime grouping.
    pub fn flatten(&self) -> Vec<Device> {
        self.devices.values().flatten().cloned().collect()
    }
}

/// Human readable runtime name, e.g. `iOS 17.2` for
/// `com.apple.CoreSimulator.SimRuntime.iOS-17-2`. Older simctl versions
/// already report display names; those are returned unchanged.
pub fn runtime_display_name(runtime: &str) -> String {
    let Some(rest) = runtime.strip_prefix(RUNTIME_PREFIX) else {
        return runtime.to_string();
    };
    match rest.split_once('-') {
        Some((os, version)) => format!("{os} {}", version.replace('-', ".")),
        None => rest.to_string(),
    }
}

/// Source of simulator devices.
pub trait DeviceSource {
    fn list_devices(&self) -> Result<DeviceList>;

    fn flat_list_devices(&self) -> Result<Vec<Device>> {
        Ok(self.list_devices()?.flatten())
    }
}

/// Runs `xcrun simctl list devices --json`.
pub struct SimctlDeviceSource;

impl DeviceSource for SimctlDeviceSource {
    fn list_devices(&self) -> Result<DeviceList> {
        let output = Command::new("xcrun")
            .args(["simctl", "list", "devices", "--json"])
            .output()
            .context("run xcrun simctl list devices")?;
        if !output.status.success() {
            anyhow::bail!(
                "simctl list devices failed: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }
        let json = String::from_utf8(output.stdout).context("simctl output is not UTF-8")?;
        DeviceList::from_json(&json)
    }
}

/// Reads a saved simctl listing from a file (for tests and offline use).
#[derive(Clone)]
pub struct JsonFileDeviceSource {
    path: PathBuf,
}

impl JsonFileDeviceSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl DeviceSource for JsonFileDeviceSource {
    fn list_devices(&self) -> Result<DeviceList> {
        let json = std::fs::read_to_string(&self.path)
            .with_context(|| format!("read device list: {}", self.path.display()))?;
        DeviceList::from_json(&json)
    }
}

/// Device source for this host.
/// If SIMTRUST_DEVICES_JSON is set, reads the listing from that file instead.
pub fn default_device_source() -> Box<dyn DeviceSource> {
    if let Ok(path) = std::env::var("SIMTRUST_DEVICES_JSON") {
        return Box::new(JsonFileDeviceSource::new(path));
    }
    Box::new(SimctlDeviceSource)
}

#[cfg(test)]
mod tests {
    use super::*;

    const LISTING: &str = r#"{
        "devices": {
            "com.apple.CoreSimulator.SimRuntime.iOS-17-2": [
                {"state": "Booted", "isAvailable": true, "name": "iPhone 15", "udid": "AAAA"},
                {"state": "Shutting Down", "isAvailable": true, "name": "iPad Air", "udid": "BBBB"}
            ],
            "com.apple.CoreSimulator.SimRuntime.watchOS-10-0": [
                {"state": "Shutdown", "name": "Apple Watch", "udid": "CCCC", "deviceTypeIdentifier": "x"}
            ],
            "iOS 12.1": [
                {"state": "Hibernating", "availability": "(available)", "name": "iPhone X", "udid": "DDDD"}
            ]
        }
    }"#;

    #[test]
    fn parses_listing_and_stamps_runtime() {
        let list = DeviceList::from_json(LISTING).unwrap();
        let ios = &list.devices["com.apple.CoreSimulator.SimRuntime.iOS-17-2"];
        assert_eq!(ios[0].state, DeviceState::Booted);
        assert_eq!(ios[1].state, DeviceState::ShuttingDown);
        assert_eq!(ios[1].runtime, "com.apple.CoreSimulator.SimRuntime.iOS-17-2");
        assert_eq!(list.devices["iOS 12.1"][0].state, DeviceState::Unknown);
        assert_eq!(list.flatten().len(), 4);
    }

    #[test]
    fn display_names() {
        assert_eq!(
            runtime_display_name("com.apple.CoreSimulator.SimRuntime.iOS-17-2"),
            "iOS 17.2"
        );
        assert_eq!(
            runtime_display_name("com.apple.CoreSimulator.SimRuntime.watchOS-10-0"),
            "watchOS 10.0"
        );
        assert_eq!(runtime_display_name("iOS 12.1"), "iOS 12.1");
    }
}
