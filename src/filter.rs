//! Device selection for multi-device commands.

use clap::Args;
use serde::{Deserialize, Serialize};

use crate::device::{runtime_display_name, Device, DeviceState};

/// Filter predicates. Unset options match every device.
#[derive(Debug, Clone, Default, PartialEq, Eq, Args, Serialize, Deserialize)]
pub struct FilterOptions {
    /// Only devices whose name contains this text (case-insensitive)
    #[arg(long)]
    #[serde(default)]
    pub name: Option<String>,

    /// Only devices on a matching runtime, e.g. "iOS 17.2" or "ios-17"
    #[arg(long = "os", alias = "runtime")]
    #[serde(default, alias = "os")]
    pub runtime: Option<String>,

    /// Only devices in this power state
    #[arg(long, value_enum)]
    #[serde(default)]
    pub state: Option<DeviceState>,

    /// Only the device with this UDID
    #[arg(long)]
    #[serde(default)]
    pub udid: Option<String>,
}

impl FilterOptions {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.runtime.is_none() && self.state.is_none() && self.udid.is_none()
    }

    /// Options set here win; unset ones fall back to `defaults`.
    pub fn or(self, defaults: &FilterOptions) -> FilterOptions {
        FilterOptions {
            name: self.name.or_else(|| defaults.name.clone()),
            runtime: self.runtime.or_else(|| defaults.runtime.clone()),
            state: self.state.or(defaults.state),
            udid: self.udid.or_else(|| defaults.udid.clone()),
        }
    }

    /// True if every set predicate holds for `device`.
    pub fn matches(&self, device: &Device) -> bool {
        let name_ok = self
            .name
            .as_deref()
            .map_or(true, |n| device.name.to_lowercase().contains(&n.to_lowercase()));
        let runtime_ok = self
            .runtime
            .as_deref()
            .map_or(true, |r| runtime_matches(&device.runtime, r));
        let state_ok = self.state.map_or(true, |s| device.state == s);
        let udid_ok = self
            .udid
            .as_deref()
            .map_or(true, |u| device.udid.eq_ignore_ascii_case(u));
        name_ok && runtime_ok && state_ok && udid_ok
    }
}

/// Devices matching all set options, in input order.
pub fn filter(devices: &[Device], options: &FilterOptions) -> Vec<Device> {
    devices
        .iter()
        .filter(|d| options.matches(d))
        .cloned()
        .collect()
}

/// Lowercase and fold space/dot/hyphen into '-'.
fn normalize(s: &str) -> String {
    s.trim()
        .chars()
        .map(|c| match c {
            ' ' | '.' | '-' => '-',
            c => c.to_ascii_lowercase(),
        })
        .collect()
}

fn runtime_matches(runtime: &str, query: &str) -> bool {
    let q = normalize(query);
    if q.is_empty() {
        return true;
    }
    normalize(runtime).contains(&q) || normalize(&runtime_display_name(runtime)).contains(&q)
}
