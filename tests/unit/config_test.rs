//! Unit tests for configuration loading and saving.

use pretty_assertions::assert_eq;
use std::time::Duration;
use tempfile::tempdir;
use wattspeed::storage::config::{
    load_config_from, save_config_to, AppConfig, ConfigError, PowerSegment,
};

#[test]
fn test_missing_file_yields_defaults() {
    let dir = tempdir().unwrap();
    let config = load_config_from(&dir.path().join("config.toml")).unwrap();

    assert_eq!(config.simulation.update_interval(), Duration::from_millis(500));
    assert_eq!(config.device.scan_interval(), Duration::from_secs(1));
    assert_eq!(config.demo.total_duration_secs(), 38.0);
}

#[test]
fn test_save_and_load() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("nested").join("config.toml");

    let mut config = AppConfig::default();
    config.simulation.update_interval_ms = 250;
    config.simulation.bike_mass_kg = 7.5;
    config.demo.segments = vec![PowerSegment {
        duration_secs: 4.0,
        watts: 320.0,
    }];

    save_config_to(&config, &path).unwrap();
    let loaded = load_config_from(&path).unwrap();

    assert_eq!(loaded.simulation, config.simulation);
    assert_eq!(loaded.demo, config.demo);
    assert_eq!(loaded.simulation.physics().bike_mass_kg, 7.5);
}

#[test]
fn test_partial_file_fills_defaults() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "[simulation]\nupdate_interval_ms = 1000\n").unwrap();

    let config = load_config_from(&path).unwrap();

    assert_eq!(config.simulation.update_interval(), Duration::from_secs(1));
    assert_eq!(config.simulation.max_acceleration, 5.0);
    assert_eq!(config.device.host_connection_grace_ms, 1000);
}

#[test]
fn test_invalid_file_is_parse_error() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "[simulation\nbroken").unwrap();

    let result = load_config_from(&path);
    assert!(matches!(result, Err(ConfigError::ParseError(_))));
}
