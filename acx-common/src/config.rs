//! Configuration loading
//!
//! Default compositor settings are read from an optional TOML file. The file
//! location is resolved in priority order:
//! 1. Command-line argument (highest priority)
//! 2. `ACX_CONFIG` environment variable
//! 3. `<config dir>/acx/acx.toml` (e.g. `~/.config/acx/acx.toml` on Linux)
//! 4. Compiled defaults (fallback)
//!
//! A missing file is not an error: a warning is logged and the compiled
//! defaults are used. A file that exists but does not parse is an error.
//!
//! ```toml
//! overflow = "clip"
//! overflow_log = "all"
//! fade_type = "sine"
//! frame_samples = 3072
//! log_level = "debug"
//! ```

use crate::overflow::{OverflowLog, OverflowMode};
use crate::transition::TransitionType;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Samples per frame used when nothing else is configured
pub const DEFAULT_FRAME_SAMPLES: usize = 3072;

/// Environment variable naming the configuration file
pub const CONFIG_ENV_VAR: &str = "ACX_CONFIG";

/// Raw contents of the TOML file; every key is optional
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TomlConfig {
    pub overflow: Option<OverflowMode>,
    pub overflow_log: Option<OverflowLog>,
    pub fade_type: Option<TransitionType>,
    pub frame_samples: Option<usize>,
    pub log_level: Option<String>,
}

/// Effective settings after merging the TOML file over compiled defaults
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub overflow: OverflowMode,
    pub overflow_log: OverflowLog,
    pub fade_type: TransitionType,
    pub frame_samples: usize,
    pub log_level: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            overflow: OverflowMode::default(),
            overflow_log: OverflowLog::default(),
            fade_type: TransitionType::default(),
            frame_samples: DEFAULT_FRAME_SAMPLES,
            log_level: "info".to_string(),
        }
    }
}

impl Settings {
    /// Overlay the keys present in `config` on the compiled defaults
    pub fn from_toml(config: TomlConfig) -> Result<Self> {
        let defaults = Settings::default();

        let frame_samples = config.frame_samples.unwrap_or(defaults.frame_samples);
        if frame_samples == 0 {
            return Err(Error::Config("frame_samples must be greater than 0".to_string()));
        }

        Ok(Self {
            overflow: config.overflow.unwrap_or(defaults.overflow),
            overflow_log: config.overflow_log.unwrap_or(defaults.overflow_log),
            fade_type: config.fade_type.unwrap_or(defaults.fade_type),
            frame_samples,
            log_level: config.log_level.unwrap_or(defaults.log_level),
        })
    }
}

/// Resolve the configuration file path (the file may not exist)
pub fn resolve_config_path(cli_arg: Option<&Path>) -> Option<PathBuf> {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return Some(path.to_path_buf());
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        if !path.is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    // Priority 3: platform config directory
    dirs::config_dir().map(|d| d.join("acx").join("acx.toml"))
}

/// Parse a TOML configuration file
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)?;
    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Failed to parse {}: {}", path.display(), e)))
}

/// Load the effective settings
pub fn load_settings(cli_arg: Option<&Path>) -> Result<Settings> {
    let Some(path) = resolve_config_path(cli_arg) else {
        debug!("No configuration directory available, using compiled defaults");
        return Ok(Settings::default());
    };

    if !path.exists() {
        warn!("Config file {} not found, using compiled defaults", path.display());
        return Ok(Settings::default());
    }

    debug!("Loading config file {}", path.display());
    Settings::from_toml(load_toml_config(&path)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::captured_lines;

    #[test]
    fn test_compiled_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.overflow, OverflowMode::Error);
        assert_eq!(settings.overflow_log, OverflowLog::Once);
        assert_eq!(settings.fade_type, TransitionType::Cubic);
        assert_eq!(settings.frame_samples, 3072);
        assert_eq!(settings.log_level, "info");
    }

    #[test]
    fn test_partial_toml_overlays_defaults() {
        let config: TomlConfig = toml::from_str("overflow = \"clip_int\"\nfade_type = \"sine\"").unwrap();
        let settings = Settings::from_toml(config).unwrap();

        assert_eq!(settings.overflow, OverflowMode::ClipInt);
        assert_eq!(settings.fade_type, TransitionType::Sine);
        assert_eq!(settings.overflow_log, OverflowLog::Once);
        assert_eq!(settings.frame_samples, DEFAULT_FRAME_SAMPLES);
    }

    #[test]
    fn test_zero_frame_samples_rejected() {
        let config = TomlConfig {
            frame_samples: Some(0),
            ..Default::default()
        };
        assert!(matches!(Settings::from_toml(config), Err(Error::Config(_))));
    }

    #[test]
    fn test_unknown_keys_rejected() {
        assert!(toml::from_str::<TomlConfig>("overflw = \"clip\"").is_err());
        assert!(toml::from_str::<TomlConfig>("overflow = \"wrap\"").is_err());
    }

    #[test]
    #[serial_test::serial]
    fn test_missing_default_file_warns() {
        let dir = tempfile::TempDir::new().unwrap();
        std::env::remove_var(CONFIG_ENV_VAR);
        let previous = std::env::var_os("XDG_CONFIG_HOME");
        std::env::set_var("XDG_CONFIG_HOME", dir.path());

        let mut settings = None;
        let lines = captured_lines(|| settings = Some(load_settings(None).unwrap()));

        match previous {
            Some(value) => std::env::set_var("XDG_CONFIG_HOME", value),
            None => std::env::remove_var("XDG_CONFIG_HOME"),
        }

        assert_eq!(settings, Some(Settings::default()));
        // dirs ignores XDG_CONFIG_HOME outside Linux
        if cfg!(target_os = "linux") {
            assert_eq!(lines.len(), 1, "{:?}", lines);
            assert!(lines[0].starts_with("WARN"));
            assert!(lines[0].contains("not found, using compiled defaults"));
        }
    }

    #[test]
    #[serial_test::serial]
    fn test_missing_explicit_file_warns() {
        let dir = tempfile::TempDir::new().unwrap();
        let missing = dir.path().join("missing.toml");

        let mut settings = None;
        let lines = captured_lines(|| settings = Some(load_settings(Some(&missing)).unwrap()));

        assert_eq!(settings, Some(Settings::default()));
        assert_eq!(lines.len(), 1, "{:?}", lines);
        assert!(lines[0].starts_with("WARN"));
    }

    #[test]
    fn test_cli_arg_has_priority() {
        let path = resolve_config_path(Some(Path::new("/tmp/acx-test.toml")));
        assert_eq!(path, Some(PathBuf::from("/tmp/acx-test.toml")));
    }
}
