//! Integration tests for configuration loading
//!
//! Covers:
//! - Missing TOML files do not cause termination
//! - Malformed TOML files are reported as configuration errors
//! - Priority order for config file location
//!
//! Note: Uses serial_test to prevent ENV variable race conditions.
//! Tests that manipulate TALLY_CONFIG are marked with #[serial].

use serial_test::serial;
use std::env;
use std::path::{Path, PathBuf};
use tally_common::config::{
    load_toml_config, locate_config_file, ConfigOverrides, Settings, CONFIG_ENV_VAR,
};
use tally_common::Error;
use tempfile::TempDir;

#[test]
fn test_missing_config_file_yields_none() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("absent.toml");

    let loaded = load_toml_config(&path).unwrap();

    assert!(loaded.is_none());
}

#[test]
fn test_malformed_config_file_is_error() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("config.toml");
    std::fs::write(&path, "port = \"not a number\"\n[[[").unwrap();

    let err = load_toml_config(&path).unwrap_err();

    assert!(matches!(err, Error::Config(_)));
}

#[test]
fn test_full_config_file_round_trips_into_settings() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("config.toml");
    std::fs::write(
        &path,
        r#"
intake_channel_id = 1329119283686670427
data_file = "/srv/tally/ratings.json"
port = 9090
season_label = "الموسم الرابع"
episode_marker = "الحلقة"

[logging]
level = "debug"
"#,
    )
    .unwrap();

    let file = load_toml_config(&path).unwrap();
    let settings = Settings::resolve(ConfigOverrides::default(), file).unwrap();

    assert_eq!(settings.intake_channel_id.as_str(), "1329119283686670427");
    assert_eq!(settings.data_file, PathBuf::from("/srv/tally/ratings.json"));
    assert_eq!(settings.port, 9090);
    assert_eq!(settings.bind_address, "0.0.0.0");
    assert_eq!(settings.titles.title(2), "الموسم الرابع - الحلقة 2");
    assert_eq!(settings.log_level, "debug");
}

#[test]
#[serial]
fn test_explicit_path_wins_over_env() {
    env::set_var(CONFIG_ENV_VAR, "/tmp/tally-from-env.toml");

    let located = locate_config_file(Some(Path::new("/tmp/tally-explicit.toml")));

    assert_eq!(located, Some(PathBuf::from("/tmp/tally-explicit.toml")));

    env::remove_var(CONFIG_ENV_VAR);
}

#[test]
#[serial]
fn test_env_var_locates_config() {
    env::set_var(CONFIG_ENV_VAR, "/tmp/tally-from-env.toml");

    let located = locate_config_file(None);

    assert_eq!(located, Some(PathBuf::from("/tmp/tally-from-env.toml")));

    env::remove_var(CONFIG_ENV_VAR);
}

#[test]
#[serial]
fn test_blank_env_var_is_ignored() {
    env::set_var(CONFIG_ENV_VAR, "   ");

    let located = locate_config_file(None);

    assert_ne!(located, Some(PathBuf::from("   ")));

    env::remove_var(CONFIG_ENV_VAR);
}
