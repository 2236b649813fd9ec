//! List, install, remove and export across the selected devices.
//!
//! Devices are handled one at a time. A device whose store cannot be opened
//! or written is reported and skipped; the operation fails at the end if any
//! device failed.

use anyhow::{Context, Result};
use std::io::Write;
use std::path::PathBuf;

use crate::cert::Certificate;
use crate::config::SimPaths;
use crate::device::{runtime_display_name, Device, DeviceSource};
use crate::filter::{self, FilterOptions};
use crate::truststore::{TrustStore, TrustStoreRow};

const UNKNOWN_CERTIFICATE: &str = "<unknown certificate>";

/// The operations that can run against trust stores.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    List,
    Install { path: PathBuf, dry_run: bool },
    Remove { dry_run: bool },
    Export { dir: PathBuf, format: ExportFormat },
}

/// What an operation runs against.
pub struct Target<'a> {
    pub paths: &'a SimPaths,
    pub devices: &'a dyn DeviceSource,
    pub filter: FilterOptions,
    /// Print expiry and SHA-1 next to each certificate.
    pub show_details: bool,
}

impl Target<'_> {
    fn store_for(&self, device: &Device) -> TrustStore {
        TrustStore::new(&self.paths.devices_dir, &device.udid)
    }

    fn selected_devices(&self) -> Result<Vec<Device>> {
        let all = self.devices.flat_list_devices()?;
        Ok(filter::filter(&all, &self.filter))
    }
}

/// Run `op`, writing user-facing output to `out`.
pub fn run(op: &Operation, target: &Target<'_>, out: &mut dyn Write) -> Result<()> {
    let failed = match op {
        Operation::List => list(target, out)?,
        Operation::Install { path, dry_run } => install(target, path, *dry_run, out)?,
        Operation::Remove { dry_run } => remove(target, *dry_run, out)?,
        Operation::Export { dir, format } => export(target, dir, *format, out)?,
    };
    if failed > 0 {
        anyhow::bail!("{failed} device(s) could not be processed");
    }
    Ok(())
}

fn certificate_label(row: &TrustStoreRow) -> std::result::Result<String, String> {
    row.validated_certificate()
        .map(|c| c.subject_summary().unwrap_or(UNKNOWN_CERTIFICATE).to_string())
        .map_err(|e| e.to_string())
}

fn list(target: &Target<'_>, out: &mut dyn Write) -> Result<usize> {
    let listing = target.devices.list_devices()?;
    let mut failed = 0;
    for (runtime, devices) in &listing.devices {
        let selected = filter::filter(devices, &target.filter);
        if selected.is_empty() {
            continue;
        }
        writeln!(out, "{}:", runtime_display_name(runtime))?;
        for device in &selected {
            writeln!(out, " - {}", device.name)?;
            let store = target.store_for(device);
            if !store.exists() {
                continue;
            }
            if let Err(e) = list_certificates(&store, target.show_details, out) {
                tracing::warn!(udid = %device.udid, error = %e, "cannot list trust store");
                writeln!(out, "   Cannot read trust store at {}: {e:#}", store.path.display())?;
                failed += 1;
            }
        }
    }
    Ok(failed)
}

fn list_certificates(store: &TrustStore, show_details: bool, out: &mut dyn Write) -> Result<()> {
    let conn = store.open()?;
    if !conn.is_valid() {
        writeln!(out, "   Invalid trust store at {}", store.path.display())?;
        return Ok(());
    }

    let rows = conn.rows()?;
    if rows.is_empty() {
        return Ok(());
    }
    writeln!(out, "   Certificates:")?;
    for row in &rows {
        let line = match row.validated_certificate() {
            Ok(c) => {
                let name = c.subject_summary().unwrap_or(UNKNOWN_CERTIFICATE);
                if show_details {
                    format!("{name} (expires {}) [{}]", c.not_after().date(), row.sha1_hex())
                } else {
                    name.to_string()
                }
            }
            Err(e) if show_details => format!("Invalid row: {e} [{}]", row.sha1_hex()),
            Err(e) => format!("Invalid row: {e}"),
        };
        writeln!(out, "    - {line}")?;
    }
    Ok(())
}

/// Result of installing into one device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallOutcome {
    Installed,
    AlreadyInstalled,
    InvalidStore,
}

/// Install `certificate` into `store`, creating the store if needed.
pub fn install_into(store: &TrustStore, certificate: &Certificate) -> Result<InstallOutcome> {
    store
        .create_parent_directories()
        .with_context(|| format!("create directory for {}", store.path.display()))?;
    let mut conn = store.open()?;
    conn.setup_database_if_needed()?;
    if !conn.is_valid() {
        return Ok(InstallOutcome::InvalidStore);
    }
    if conn.has_certificate(&certificate.sha1())? {
        return Ok(InstallOutcome::AlreadyInstalled);
    }
    conn.add_certificate(certificate)?;
    Ok(InstallOutcome::Installed)
}

fn install(
    target: &Target<'_>,
    path: &std::path::Path,
    dry_run: bool,
    out: &mut dyn Write,
) -> Result<usize> {
    let certificate = Certificate::load(path)?;
    let name = certificate.subject_summary().unwrap_or(UNKNOWN_CERTIFICATE);
    let mut failed = 0;

    for device in target.selected_devices()? {
        if dry_run {
            writeln!(out, "Would install {name} into {}.", device.name)?;
            continue;
        }
        let store = target.store_for(&device);
        match install_into(&store, &certificate) {
            Ok(InstallOutcome::Installed) => {
                writeln!(out, "Installed {name} into {}.", device.name)?;
            }
            Ok(InstallOutcome::AlreadyInstalled) => {
                writeln!(out, "{name} is already installed in {}.", device.name)?;
            }
            Ok(InstallOutcome::InvalidStore) => {
                writeln!(out, "Invalid trust store at {}", store.path.display())?;
            }
            Err(e) => {
                tracing::warn!(udid = %device.udid, error = %e, "install failed");
                writeln!(out, "Failed to install into {}: {e:#}", device.name)?;
                failed += 1;
            }
        }
    }
    Ok(failed)
}

fn remove(target: &Target<'_>, dry_run: bool, out: &mut dyn Write) -> Result<usize> {
    let mut failed = 0;
    for device in target.selected_devices()? {
        let store = target.store_for(&device);
        if !store.exists() {
            continue;
        }
        if let Err(e) = remove_certificates(&store, &device.name, dry_run, out) {
            tracing::warn!(udid = %device.udid, error = %e, "remove failed");
            writeln!(out, "Failed to remove from {}: {e:#}", device.name)?;
            failed += 1;
        }
    }
    Ok(failed)
}

fn remove_certificates(
    store: &TrustStore,
    device_name: &str,
    dry_run: bool,
    out: &mut dyn Write,
) -> Result<()> {
    let conn = store.open()?;
    if !conn.is_valid() {
        writeln!(out, "Invalid trust store at {}", store.path.display())?;
        return Ok(());
    }
    let mut missed = 0;
    for row in conn.rows()? {
        let name = certificate_label(&row)
            .unwrap_or_else(|reason| format!("<invalid row {}: {reason}>", row.sha1_hex()));
        if dry_run {
            writeln!(out, "Would remove certificate {name} from {device_name}.")?;
        } else if conn.remove_row(&row)? {
            writeln!(out, "Removed certificate {name} from {device_name}.")?;
        } else {
            writeln!(out, "Could not remove certificate {name} from {device_name}.")?;
            missed += 1;
        }
    }
    if missed > 0 {
        anyhow::bail!("{missed} row(s) were not removed");
    }
    Ok(())
}

/// On-disk encoding for exported certificates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ExportFormat {
    Pem,
    Der,
}

impl ExportFormat {
    fn extension(self) -> &'static str {
        match self {
            ExportFormat::Pem => "pem",
            ExportFormat::Der => "der",
        }
    }
}

fn export(
    target: &Target<'_>,
    dir: &std::path::Path,
    format: ExportFormat,
    out: &mut dyn Write,
) -> Result<usize> {
    let mut failed = 0;
    for device in target.selected_devices()? {
        let store = target.store_for(&device);
        if !store.exists() {
            continue;
        }
        let device_dir = dir.join(&device.udid);
        if let Err(e) = export_certificates(&store, &device, &device_dir, format, out) {
            tracing::warn!(udid = %device.udid, error = %e, "export failed");
            writeln!(out, "Failed to export from {}: {e:#}", device.name)?;
            failed += 1;
        }
    }
    Ok(failed)
}

/// Write every valid certificate in `store` to `<device_dir>/<sha1>.<ext>`.
fn export_certificates(
    store: &TrustStore,
    device: &Device,
    device_dir: &std::path::Path,
    format: ExportFormat,
    out: &mut dyn Write,
) -> Result<()> {
    let conn = store.open()?;
    if !conn.is_valid() {
        writeln!(out, "Invalid trust store at {}", store.path.display())?;
        return Ok(());
    }
    for row in conn.rows()? {
        let certificate = match row.validated_certificate() {
            Ok(c) => c,
            Err(e) => {
                writeln!(out, "Skipping invalid row in {}: {e}", device.name)?;
                continue;
            }
        };
        std::fs::create_dir_all(device_dir)
            .with_context(|| format!("create directory {}", device_dir.display()))?;
        let path = device_dir.join(format!("{}.{}", row.sha1_hex(), format.extension()));
        let bytes = match format {
            ExportFormat::Pem => certificate.to_pem().into_bytes(),
            ExportFormat::Der => certificate.der().to_vec(),
        };
        std::fs::write(&path, bytes).with_context(|| format!("write {}", path.display()))?;
        let name = certificate.subject_summary().unwrap_or(UNKNOWN_CERTIFICATE);
        writeln!(out, "Exported {name} from {} to {}.", device.name, path.display())?;
    }
    Ok(())
}
