//! Config loading and default filters.

mod common;

use simtrust::config::{Config, SimPaths};
use simtrust::device::DeviceState;
use simtrust::filter::FilterOptions;
use std::path::PathBuf;

#[test]
fn missing_config_is_default() {
    let dir = common::temp_home();
    let paths = SimPaths::for_test(dir.path());
    assert_eq!(Config::load(&paths).unwrap(), Config::default());
}

#[test]
fn serialized_config_loads_back() {
    let dir = common::temp_home();
    let paths = SimPaths::for_test(dir.path());
    let config = Config {
        devices_dir: Some(PathBuf::from("/tmp/devices")),
        filter: FilterOptions {
            runtime: Some("iOS 17".into()),
            state: Some(DeviceState::Booted),
            ..Default::default()
        },
    };
    std::fs::write(&paths.config_file, toml::to_string_pretty(&config).unwrap()).unwrap();
    assert_eq!(Config::load(&paths).unwrap(), config);
}

#[test]
fn hand_written_config_parses() {
    let dir = common::temp_home();
    let paths = SimPaths::for_test(dir.path());
    std::fs::write(
        &paths.config_file,
        "[filter]\nos = \"iOS 17.2\"\nstate = \"booted\"\n",
    )
    .unwrap();
    let config = Config::load(&paths).unwrap();
    assert_eq!(config.filter.runtime.as_deref(), Some("iOS 17.2"));
    assert_eq!(config.filter.state, Some(DeviceState::Booted));
    assert!(config.devices_dir.is_none());
}
