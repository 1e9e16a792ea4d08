//! Integration tests for configuration file resolution and loading
//!
//! Tests that manipulate ACX_CONFIG are marked with #[serial] so they do
//! not race on the process environment.

use acx_common::config::{load_settings, resolve_config_path, Settings, CONFIG_ENV_VAR};
use acx_common::{Error, OverflowLog, OverflowMode, TransitionType};
use serial_test::serial;
use std::env;
use std::io::Write;

fn write_config(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

#[test]
#[serial]
fn test_env_var_used_when_no_cli_arg() {
    let file = write_config("overflow = \"clip\"\noverflow_log = \"none\"\n");
    env::set_var(CONFIG_ENV_VAR, file.path());

    let resolved = resolve_config_path(None);
    let settings = load_settings(None).unwrap();

    env::remove_var(CONFIG_ENV_VAR);

    assert_eq!(resolved.as_deref(), Some(file.path()));
    assert_eq!(settings.overflow, OverflowMode::Clip);
    assert_eq!(settings.overflow_log, OverflowLog::None);
}

#[test]
#[serial]
fn test_cli_arg_overrides_env_var() {
    let env_file = write_config("overflow = \"clip\"\n");
    let cli_file = write_config("overflow = \"keep_float\"\nframe_samples = 8\n");
    env::set_var(CONFIG_ENV_VAR, env_file.path());

    let settings = load_settings(Some(cli_file.path())).unwrap();

    env::remove_var(CONFIG_ENV_VAR);

    assert_eq!(settings.overflow, OverflowMode::KeepFloat);
    assert_eq!(settings.frame_samples, 8);
}

#[test]
#[serial]
fn test_missing_file_falls_back_to_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("does-not-exist.toml");

    let settings = load_settings(Some(&missing)).unwrap();

    assert_eq!(settings, Settings::default());
}

#[test]
#[serial]
fn test_malformed_file_is_config_error() {
    let file = write_config("fade_type = [1, 2\n");

    let result = load_settings(Some(file.path()));

    assert!(matches!(result, Err(Error::Config(_))), "got {:?}", result);
}

#[test]
#[serial]
fn test_full_file() {
    let file = write_config(
        "overflow = \"clip_int\"\n\
         overflow_log = \"all\"\n\
         fade_type = \"linear\"\n\
         frame_samples = 1024\n\
         log_level = \"debug\"\n",
    );

    let settings = load_settings(Some(file.path())).unwrap();

    assert_eq!(settings.overflow, OverflowMode::ClipInt);
    assert_eq!(settings.overflow_log, OverflowLog::All);
    assert_eq!(settings.fade_type, TransitionType::Linear);
    assert_eq!(settings.frame_samples, 1024);
    assert_eq!(settings.log_level, "debug");
}
