//! Configuration loading and path resolution.
//!
//! Supports SIMTRUST_HOME and SIMTRUST_DEVICES_DIR env var overrides for testing.

use anyhow::{Context, Result};
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use crate::filter::FilterOptions;

/// CoreSimulator device directory relative to the home directory.
const DEVICES_RELATIVE_PATH: &str = "Library/Developer/CoreSimulator/Devices";

/// Paths used by simtrust.
#[derive(Debug, Clone)]
pub struct SimPaths {
    pub config_dir: PathBuf,
    pub config_file: PathBuf,
    pub devices_dir: PathBuf,
}

impl SimPaths {
    pub fn new(config_dir: PathBuf, devices_dir: PathBuf) -> Self {
        let config_file = config_dir.join("config.toml");
        Self {
            config_dir,
            config_file,
            devices_dir,
        }
    }

    /// Paths for testing: config in `base`, devices under `base/Devices`.
    pub fn for_test(base: impl AsRef<Path>) -> Self {
        let base = base.as_ref();
        Self::new(base.to_path_buf(), base.join("Devices"))
    }

    /// Default paths (respects SIMTRUST_HOME and SIMTRUST_DEVICES_DIR).
    pub fn default_paths() -> Self {
        let config_dir = if let Ok(home) = std::env::var("SIMTRUST_HOME") {
            PathBuf::from(home)
        } else if let Some(dirs) = directories::ProjectDirs::from("com", "simtrust", "simtrust") {
            dirs.config_dir().to_path_buf()
        } else {
            PathBuf::from(".simtrust")
        };

        let devices_dir = if let Ok(dir) = std::env::var("SIMTRUST_DEVICES_DIR") {
            PathBuf::from(dir)
        } else if let Some(base) = directories::BaseDirs::new() {
            base.home_dir().join(DEVICES_RELATIVE_PATH)
        } else {
            PathBuf::from(DEVICES_RELATIVE_PATH)
        };

        Self::new(config_dir, devices_dir)
    }

    /// Apply `devices_dir` from config unless the environment already chose one.
    pub fn with_config(mut self, config: &Config) -> Self {
        if std::env::var_os("SIMTRUST_DEVICES_DIR").is_none() {
            if let Some(dir) = &config.devices_dir {
                self.devices_dir = dir.clone();
            }
        }
        self
    }
}

/// config.toml structure.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Config {
    #[serde(default)]
    pub devices_dir: Option<PathBuf>,
    /// Default device filter; command-line options override it.
    #[serde(default)]
    pub filter: FilterOptions,
}

impl Config {
    /// Load config (with shared lock when file exists). Missing file = defaults.
    pub fn load(paths: &SimPaths) -> Result<Config> {
        if !paths.config_file.is_file() {
            return Ok(Config::default());
        }
        let mut file = fs::OpenOptions::new()
            .read(true)
            .open(&paths.config_file)
            .with_context(|| format!("open config: {}", paths.config_file.display()))?;
        fs2::FileExt::lock_shared(&file)?;
        let mut s = String::new();
        file.read_to_string(&mut s)?;
        let cfg: Config = toml::from_str(&s)
            .with_context(|| format!("parse config: {}", paths.config_file.display()))?;
        Ok(cfg)
    }
}
