//! Tests for service configuration resolution
//!
//! - CLI → ENV → TOML → compiled default for every setting
//! - Out-of-range limits fall back to the default
//! - Recommender token is looked up at call time (ENV first, then TOML)
//!
//! Note: Uses serial_test crate to prevent ENV variable race conditions.
//! Tests that manipulate MOODTUNE_* variables are marked with #[serial].

use moodtune_common::config::TomlConfig;
use moodtune_core::config::{
    CliOverrides, ConfiguredToken, ServiceConfig, TokenSource, ENV_DETECTOR_URL,
    ENV_DEFAULT_LIMIT, ENV_PORT, ENV_RECOMMENDER_TOKEN, ENV_RECOMMENDER_URL,
    ENV_REQUEST_TIMEOUT_SECS,
};
use serial_test::serial;
use std::env;
use std::time::Duration;

fn clear_env() {
    for var in [
        ENV_PORT,
        ENV_DETECTOR_URL,
        ENV_RECOMMENDER_URL,
        ENV_RECOMMENDER_TOKEN,
        ENV_DEFAULT_LIMIT,
        ENV_REQUEST_TIMEOUT_SECS,
    ] {
        env::remove_var(var);
    }
}

fn toml_with_port(port: u16) -> TomlConfig {
    TomlConfig {
        port: Some(port),
        detector_url: Some("http://toml-detector/detect-emotion".to_string()),
        default_limit: Some(25),
        ..TomlConfig::default()
    }
}

#[test]
#[serial]
fn test_defaults_when_nothing_configured() {
    clear_env();

    let config = ServiceConfig::resolve(&CliOverrides::default(), &TomlConfig::default());

    assert_eq!(config.port, 5780);
    assert_eq!(config.detector_url, "http://127.0.0.1:5000/detect-emotion");
    assert_eq!(config.recommender_url, "https://api.spotify.com/v1/recommendations");
    assert_eq!(config.default_limit, 10);
    assert_eq!(config.request_timeout, Duration::from_secs(30));
    assert!(config.recommender_token.is_none());
}

#[test]
#[serial]
fn test_toml_overrides_defaults() {
    clear_env();

    let config = ServiceConfig::resolve(&CliOverrides::default(), &toml_with_port(6001));

    assert_eq!(config.port, 6001);
    assert_eq!(config.detector_url, "http://toml-detector/detect-emotion");
    assert_eq!(config.default_limit, 25);
}

#[test]
#[serial]
fn test_env_overrides_toml() {
    clear_env();
    env::set_var(ENV_PORT, "6002");
    env::set_var(ENV_DETECTOR_URL, "http://env-detector/detect-emotion");

    let config = ServiceConfig::resolve(&CliOverrides::default(), &toml_with_port(6001));

    assert_eq!(config.port, 6002);
    assert_eq!(config.detector_url, "http://env-detector/detect-emotion");
    assert_eq!(config.default_limit, 25);

    clear_env();
}

#[test]
#[serial]
fn test_cli_overrides_everything() {
    clear_env();
    env::set_var(ENV_PORT, "6002");

    let cli = CliOverrides {
        port: Some(6003),
        detector_url: Some("http://cli-detector/detect-emotion".to_string()),
        recommender_url: None,
        default_limit: Some(3),
    };
    let config = ServiceConfig::resolve(&cli, &toml_with_port(6001));

    assert_eq!(config.port, 6003);
    assert_eq!(config.detector_url, "http://cli-detector/detect-emotion");
    assert_eq!(config.default_limit, 3);

    clear_env();
}

#[test]
#[serial]
fn test_out_of_range_limit_uses_default() {
    clear_env();

    let cli = CliOverrides {
        default_limit: Some(0),
        ..CliOverrides::default()
    };
    assert_eq!(ServiceConfig::resolve(&cli, &TomlConfig::default()).default_limit, 10);

    let cli = CliOverrides {
        default_limit: Some(500),
        ..CliOverrides::default()
    };
    assert_eq!(ServiceConfig::resolve(&cli, &TomlConfig::default()).default_limit, 10);
}

#[test]
#[serial]
fn test_zero_timeout_is_clamped() {
    clear_env();
    env::set_var(ENV_REQUEST_TIMEOUT_SECS, "0");

    let config = ServiceConfig::resolve(&CliOverrides::default(), &TomlConfig::default());
    assert_eq!(config.request_timeout, Duration::from_secs(1));

    clear_env();
}

#[test]
#[serial]
fn test_token_prefers_env_and_is_reread_each_call() {
    clear_env();
    let source = ConfiguredToken::new(Some("toml-token".to_string()));

    assert_eq!(source.current_token().as_deref(), Some("toml-token"));

    env::set_var(ENV_RECOMMENDER_TOKEN, "rotated-token");
    assert_eq!(source.current_token().as_deref(), Some("rotated-token"));

    env::set_var(ENV_RECOMMENDER_TOKEN, "   ");
    assert_eq!(source.current_token().as_deref(), Some("toml-token"));

    clear_env();
}

#[test]
#[serial]
fn test_blank_toml_token_is_ignored() {
    clear_env();
    let toml = TomlConfig {
        recommender_token: Some("  ".to_string()),
        ..TomlConfig::default()
    };

    let config = ServiceConfig::resolve(&CliOverrides::default(), &toml);
    assert!(config.recommender_token.is_none());
    assert!(ConfiguredToken::new(config.recommender_token).current_token().is_none());
}
