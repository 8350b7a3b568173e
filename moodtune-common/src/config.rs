//! Configuration loading and config file resolution
//!
//! Bootstrap settings come from a TOML file. Every setting is resolved in this order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default (fallback)
//!
//! A missing or unreadable config file is never fatal: a warning is logged and the
//! compiled defaults are used.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Directory name under the platform config dir
pub const CONFIG_DIR_NAME: &str = "moodtune";

/// Compiled defaults used when nothing else supplies a value
#[derive(Debug, Clone)]
pub struct CompiledDefaults {
    pub port: u16,
    pub detector_url: String,
    pub recommender_url: String,
    pub default_limit: u32,
    pub request_timeout_secs: u64,
}

impl Default for CompiledDefaults {
    fn default() -> Self {
        Self {
            port: 5780,
            detector_url: "http://127.0.0.1:5000/detect-emotion".to_string(),
            recommender_url: "https://api.spotify.com/v1/recommendations".to_string(),
            default_limit: 10,
            request_timeout_secs: 30,
        }
    }
}

/// Bootstrap configuration loaded from TOML file
///
/// All fields are optional; absent fields fall through to environment/defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    /// HTTP server port
    #[serde(default)]
    pub port: Option<u16>,

    /// Emotion classifier endpoint
    #[serde(default)]
    pub detector_url: Option<String>,

    /// Track recommendation endpoint
    #[serde(default)]
    pub recommender_url: Option<String>,

    /// Bearer token for the recommendation service
    #[serde(default)]
    pub recommender_token: Option<String>,

    /// Default number of tracks requested per analysis
    #[serde(default)]
    pub default_limit: Option<u32>,

    /// Timeout applied to each outbound request
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,

    /// Logging configuration (optional)
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Get default configuration file path for the platform
///
/// `~/.config/moodtune/config.toml` on Linux, the equivalent config dir elsewhere.
pub fn default_config_path() -> Result<PathBuf> {
    dirs::config_dir()
        .map(|d| d.join(CONFIG_DIR_NAME).join("config.toml"))
        .ok_or_else(|| Error::Config("Could not determine config directory".to_string()))
}

/// Read and parse a TOML config file
pub fn read_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)?;
    let config = toml::from_str::<TomlConfig>(&content)?;
    Ok(config)
}

/// Load the TOML config, degrading to defaults
///
/// `explicit_path` (from the command line) wins over the platform default location.
pub fn load_toml_config(explicit_path: Option<&Path>) -> TomlConfig {
    let path = match explicit_path {
        Some(p) => p.to_path_buf(),
        None => match default_config_path() {
            Ok(p) => p,
            Err(e) => {
                warn!("{}; using compiled defaults", e);
                return TomlConfig::default();
            }
        },
    };

    if !path.exists() {
        info!("No config file at {}; using defaults", path.display());
        return TomlConfig::default();
    }

    match read_toml_config(&path) {
        Ok(config) => {
            info!("Loaded config from {}", path.display());
            config
        }
        Err(e) => {
            warn!("Failed to load config {}: {}; using defaults", path.display(), e);
            TomlConfig::default()
        }
    }
}

/// Resolve one setting through CLI → ENV → TOML → default
///
/// Environment values that fail to parse are ignored with a warning.
pub fn resolve_setting<T>(
    cli_value: Option<T>,
    env_var_name: &str,
    toml_value: Option<T>,
    default: T,
) -> T
where
    T: std::str::FromStr,
{
    // Priority 1: Command-line argument
    if let Some(value) = cli_value {
        return value;
    }

    // Priority 2: Environment variable
    if let Ok(raw) = std::env::var(env_var_name) {
        match raw.trim().parse::<T>() {
            Ok(value) => return value,
            Err(_) => warn!("Ignoring unparseable {}={:?}", env_var_name, raw),
        }
    }

    // Priority 3: TOML config file
    if let Some(value) = toml_value {
        return value;
    }

    // Priority 4: Compiled default
    default
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_toml_parses() {
        let config: TomlConfig = toml::from_str("port = 6000\n").unwrap();
        assert_eq!(config.port, Some(6000));
        assert!(config.detector_url.is_none());
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_cli_wins_over_toml() {
        let value = resolve_setting(
            Some(1u16),
            "MOODTUNE_TEST_UNSET_VARIABLE",
            Some(2u16),
            3u16,
        );
        assert_eq!(value, 1);
    }

    #[test]
    fn test_default_when_nothing_set() {
        let value = resolve_setting(
            None::<u32>,
            "MOODTUNE_TEST_UNSET_VARIABLE",
            None,
            10,
        );
        assert_eq!(value, 10);
    }
}
