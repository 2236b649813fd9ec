//! CLI definitions and command routing.

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use crate::commands::{self, ExportFormat, Operation, Target};
use crate::config::{Config, SimPaths};
use crate::filter::FilterOptions;

#[derive(Parser)]
#[command(name = "simtrust", version)]
#[command(about = "Manage trusted root certificates in Xcode simulators")]
pub struct Cli {
    /// How much to log to stderr
    #[arg(long, global = true, value_enum, default_value_t = Verbosity::Normal)]
    pub verbosity: Verbosity,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Verbosity {
    Silent,
    Normal,
    Loud,
}

impl Verbosity {
    fn default_directive(self) -> &'static str {
        match self {
            Verbosity::Silent => "off",
            Verbosity::Normal => "simtrust=warn",
            Verbosity::Loud => "simtrust=debug",
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// List certificates in each simulator's trust store
    List {
        #[command(flatten)]
        filter: FilterOptions,
    },
    /// Install a Certificate Authority into simulator trust stores
    Install {
        /// Path to the certificate (PEM or DER)
        path: PathBuf,
        /// Don't actually install the certificate
        #[arg(long)]
        dry_run: bool,
        #[command(flatten)]
        filter: FilterOptions,
    },
    /// Remove all Certificate Authorities from the selected simulators
    Remove {
        /// Don't actually remove any certificates
        #[arg(long)]
        dry_run: bool,
        #[command(flatten)]
        filter: FilterOptions,
    },
    /// Export certificates from simulator trust stores into a directory
    Export {
        /// Output directory; one subdirectory per device UDID
        dir: PathBuf,
        /// File encoding for exported certificates
        #[arg(long, value_enum, default_value_t = ExportFormat::Pem)]
        format: ExportFormat,
        #[command(flatten)]
        filter: FilterOptions,
    },
}

impl Commands {
    fn into_operation(self) -> (Operation, FilterOptions) {
        match self {
            Commands::List { filter } => (Operation::List, filter),
            Commands::Install {
                path,
                dry_run,
                filter,
            } => (Operation::Install { path, dry_run }, filter),
            Commands::Remove { dry_run, filter } => (Operation::Remove { dry_run }, filter),
            Commands::Export {
                dir,
                format,
                filter,
            } => (Operation::Export { dir, format }, filter),
        }
    }
}

/// Install the stderr log subscriber. RUST_LOG overrides `verbosity`.
pub fn init_logging(verbosity: Verbosity) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(verbosity.default_directive()));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Run CLI and dispatch to handlers.
pub fn run() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbosity);

    let paths = SimPaths::default_paths();
    let config = Config::load(&paths)?;
    let paths = paths.with_config(&config);
    tracing::debug!(devices_dir = %paths.devices_dir.display(), "resolved paths");

    let (op, filter) = cli.command.into_operation();
    let devices = crate::device::default_device_source();
    let target = Target {
        paths: &paths,
        devices: devices.as_ref(),
        filter: filter.or(&config.filter),
        show_details: cli.verbosity == Verbosity::Loud,
    };

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    commands::run(&op, &target, &mut out)
}
