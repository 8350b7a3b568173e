//! Configuration resolution for moodtune-core
//!
//! Every setting resolves CLI → ENV → TOML → compiled default. The recommender bearer
//! token is never passed on the command line; it is read through a `TokenSource` at
//! call time so an externally refreshed token is picked up without a restart.

use moodtune_common::config::{resolve_setting, CompiledDefaults, TomlConfig};
use std::time::Duration;
use tracing::{info, warn};

pub const ENV_PORT: &str = "MOODTUNE_PORT";
pub const ENV_DETECTOR_URL: &str = "MOODTUNE_DETECTOR_URL";
pub const ENV_RECOMMENDER_URL: &str = "MOODTUNE_RECOMMENDER_URL";
pub const ENV_RECOMMENDER_TOKEN: &str = "MOODTUNE_RECOMMENDER_TOKEN";
pub const ENV_DEFAULT_LIMIT: &str = "MOODTUNE_DEFAULT_LIMIT";
pub const ENV_REQUEST_TIMEOUT_SECS: &str = "MOODTUNE_REQUEST_TIMEOUT_SECS";

/// Upper bound accepted for the per-request track limit
pub const MAX_TRACK_LIMIT: u32 = 100;

/// Values given on the command line (all optional)
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub port: Option<u16>,
    pub detector_url: Option<String>,
    pub recommender_url: Option<String>,
    pub default_limit: Option<u32>,
}

/// Fully resolved service configuration
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub port: u16,
    pub detector_url: String,
    pub recommender_url: String,
    /// Token from TOML; the environment is re-checked on every call
    pub recommender_token: Option<String>,
    pub default_limit: u32,
    pub request_timeout: Duration,
}

impl ServiceConfig {
    /// Resolve every setting from its sources
    pub fn resolve(cli: &CliOverrides, toml_config: &TomlConfig) -> Self {
        let defaults = CompiledDefaults::default();

        let default_limit = resolve_setting(
            cli.default_limit,
            ENV_DEFAULT_LIMIT,
            toml_config.default_limit,
            defaults.default_limit,
        );
        let default_limit = if default_limit == 0 || default_limit > MAX_TRACK_LIMIT {
            warn!(
                "Track limit {} out of range 1..={}, using {}",
                default_limit, MAX_TRACK_LIMIT, defaults.default_limit
            );
            defaults.default_limit
        } else {
            default_limit
        };

        let timeout_secs = resolve_setting(
            None,
            ENV_REQUEST_TIMEOUT_SECS,
            toml_config.request_timeout_secs,
            defaults.request_timeout_secs,
        )
        .max(1);

        let config = Self {
            port: resolve_setting(cli.port, ENV_PORT, toml_config.port, defaults.port),
            detector_url: resolve_setting(
                cli.detector_url.clone(),
                ENV_DETECTOR_URL,
                toml_config.detector_url.clone(),
                defaults.detector_url,
            ),
            recommender_url: resolve_setting(
                cli.recommender_url.clone(),
                ENV_RECOMMENDER_URL,
                toml_config.recommender_url.clone(),
                defaults.recommender_url,
            ),
            recommender_token: toml_config
                .recommender_token
                .clone()
                .filter(|t| is_valid_token(t)),
            default_limit,
            request_timeout: Duration::from_secs(timeout_secs),
        };

        info!(
            port = config.port,
            detector_url = %config.detector_url,
            recommender_url = %config.recommender_url,
            default_limit = config.default_limit,
            "Service configuration resolved"
        );
        config
    }
}

/// Validate token (non-empty, non-whitespace)
pub fn is_valid_token(token: &str) -> bool {
    !token.trim().is_empty()
}

/// Supplier of the currently valid recommender credential
///
/// Token issuance and refresh live outside this service; implementations only report
/// what is valid right now.
pub trait TokenSource: Send + Sync {
    fn current_token(&self) -> Option<String>;
}

/// Environment variable first (so an external refresher can rotate it), then TOML value
pub struct ConfiguredToken {
    env_var: String,
    fallback: Option<String>,
}

impl ConfiguredToken {
    pub fn new(fallback: Option<String>) -> Self {
        Self::with_env_var(ENV_RECOMMENDER_TOKEN, fallback)
    }

    pub fn with_env_var(env_var: impl Into<String>, fallback: Option<String>) -> Self {
        Self {
            env_var: env_var.into(),
            fallback,
        }
    }
}

impl TokenSource for ConfiguredToken {
    fn current_token(&self) -> Option<String> {
        if let Ok(token) = std::env::var(&self.env_var) {
            if is_valid_token(&token) {
                return Some(token.trim().to_string());
            }
        }
        self.fallback
            .as_ref()
            .filter(|t| is_valid_token(t))
            .map(|t| t.trim().to_string())
    }
}

/// Fixed token, mainly for tests and embedding
pub struct StaticToken(pub Option<String>);

impl TokenSource for StaticToken {
    fn current_token(&self) -> Option<String> {
        self.0.clone().filter(|t| is_valid_token(t))
    }
}
