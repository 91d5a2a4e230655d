//! System-wide configuration file
//!
//! Lives at `<config dir>/settle/config.toml` unless `SETTLE_CONFIG`
//! points elsewhere. A missing file means all defaults.

use anyhow::{Context, Result};
use debounce::DebounceConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable overriding the config file location
pub const CONFIG_ENV_VAR: &str = "SETTLE_CONFIG";

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemConfig {
    pub debounce: DebounceConfig,
    pub output: OutputConfig,
}

/// Output formatting options
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Prefix printed lines with the local time they were emitted
    pub timestamps: bool,
}

impl SystemConfig {
    /// Check that all values are within their valid ranges
    pub fn validate(&self) -> Result<()> {
        self.debounce
            .validate()
            .context("Invalid [debounce] section")?;
        Ok(())
    }
}

/// Path of the config file, honouring `SETTLE_CONFIG`
pub fn config_file_path() -> Option<PathBuf> {
    if let Some(path) = std::env::var_os(CONFIG_ENV_VAR) {
        return Some(PathBuf::from(path));
    }
    dirs::config_dir().map(|dir| dir.join("settle").join("config.toml"))
}

/// Load the config file, falling back to defaults if it does not exist
pub fn load() -> Result<SystemConfig> {
    match config_file_path() {
        Some(path) => load_from(&path),
        None => {
            tracing::debug!("No config directory available, using defaults");
            Ok(SystemConfig::default())
        }
    }
}

/// Load config from a specific path
pub fn load_from(path: &Path) -> Result<SystemConfig> {
    if !path.exists() {
        return Ok(SystemConfig::default());
    }

    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;
    let config: SystemConfig = toml::from_str(&contents)
        .with_context(|| format!("Failed to parse config file {}", path.display()))?;
    config.validate()?;

    Ok(config)
}

/// Save config to the default location
pub fn save(config: &SystemConfig) -> Result<()> {
    let path = config_file_path().context("Could not determine config file path")?;
    save_to(&path, config)
}

/// Save config to a specific path, creating parent directories
pub fn save_to(path: &Path, config: &SystemConfig) -> Result<()> {
    config.validate()?;

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create config directory {}", parent.display()))?;
    }

    let serialized = toml::to_string_pretty(config).context("Failed to serialize config")?;
    std::fs::write(path, serialized)
        .with_context(|| format!("Failed to write config file {}", path.display()))?;
    Ok(())
}

/// Write the default config if no file exists yet
///
/// Returns true if a file was created.
pub fn init_if_missing() -> Result<bool> {
    let path = config_file_path().context("Could not determine config file path")?;
    if path.exists() {
        return Ok(false);
    }
    save_to(&path, &SystemConfig::default())?;
    Ok(true)
}

/// Annotated example configuration
pub fn example_config() -> &'static str {
    r#"# Settle configuration
#
# Location: <config dir>/settle/config.toml (override with SETTLE_CONFIG)

[debounce]
# Quiet period in milliseconds before the latest line is emitted (0-86400000)
delay_ms = 200
# Name used in log output and failure reports
label = "stdin"

[output]
# Prefix emitted lines with the local time
timestamps = false
"#
}
