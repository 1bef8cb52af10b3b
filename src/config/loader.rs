//! Configuration loading from the process environment.

use std::str::FromStr;

use crate::config::schema::RelayConfig;
use crate::config::validation::{validate_config, ValidationError};

pub const BIND_ADDR: &str = "BIND_ADDR";
pub const PROXY_ADDR: &str = "PROXY_ADDR";
pub const PROXY_PATH: &str = "PROXY_PATH";
pub const MAX_CONNECTIONS: &str = "MAX_CONNECTIONS";
pub const PROXY_CONNECT_TIMEOUT_SECS: &str = "PROXY_CONNECT_TIMEOUT_SECS";
pub const PROXY_TIMEOUT_SECS: &str = "PROXY_TIMEOUT_SECS";
pub const METRICS_ADDR: &str = "METRICS_ADDR";

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{var} must be a non-negative integer, got {value:?}")]
    InvalidNumber { var: &'static str, value: String },

    #[error("validation failed: {}", join(.0))]
    Validation(Vec<ValidationError>),
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate configuration from the process environment.
pub fn load_from_env() -> Result<RelayConfig, ConfigError> {
    load_with(|key| std::env::var(key).ok())
}

/// Load and validate configuration from an arbitrary variable lookup.
///
/// A variable that is present is used as given, even when empty; only
/// absent variables fall back to the defaults.
pub fn load_with<F>(lookup: F) -> Result<RelayConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = RelayConfig::default();

    if let Some(bind) = lookup(BIND_ADDR) {
        config.listener.bind_address = bind;
    }
    if let Some(authority) = lookup(PROXY_ADDR) {
        config.upstream.authority = authority;
    }
    if let Some(prefix) = lookup(PROXY_PATH) {
        config.upstream.path_prefix = prefix;
    }
    if let Some(max) = parse_number(&lookup, MAX_CONNECTIONS)? {
        config.listener.max_connections = max;
    }
    if let Some(secs) = parse_number(&lookup, PROXY_CONNECT_TIMEOUT_SECS)? {
        config.timeouts.connect_secs = secs;
    }
    config.timeouts.upstream_secs = parse_number(&lookup, PROXY_TIMEOUT_SECS)?;
    config.observability.metrics_address = lookup(METRICS_ADDR).filter(|addr| !addr.is_empty());

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

fn parse_number<F, T>(lookup: &F, var: &'static str) -> Result<Option<T>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(var) {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidNumber { var, value }),
    }
}
