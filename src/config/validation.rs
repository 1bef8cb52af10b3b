//! Configuration validation.
//!
//! # Responsibilities
//! - Check the bind address is a listen address (`host:port` or `:port`)
//! - Check the upstream authority parses as an HTTP authority
//! - Validate value ranges (connection limit, timeouts)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: RelayConfig → Result<(), Vec<ValidationError>>
//! - The path prefix is never rejected; any string is a valid prefix

use std::str::FromStr;

use axum::http::uri::Authority;

use crate::config::schema::RelayConfig;

/// A single semantic problem with the configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("invalid bind address {0:?}: expected host:port or :port")]
    BindAddress(String),

    #[error("invalid upstream authority {0:?}: expected host:port")]
    UpstreamAuthority(String),

    #[error("max_connections must be greater than zero")]
    MaxConnections,

    #[error("{0} timeout must be greater than zero")]
    ZeroTimeout(&'static str),
}

/// Validate a configuration, collecting every error found.
pub fn validate_config(config: &RelayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if !is_listen_address(&config.listener.bind_address) {
        errors.push(ValidationError::BindAddress(
            config.listener.bind_address.clone(),
        ));
    }

    if Authority::from_str(&config.upstream.authority).is_err()
        || config.upstream.authority.contains('@')
    {
        errors.push(ValidationError::UpstreamAuthority(
            config.upstream.authority.clone(),
        ));
    }

    if config.listener.max_connections == 0 {
        errors.push(ValidationError::MaxConnections);
    }

    if config.timeouts.connect_secs == 0 {
        errors.push(ValidationError::ZeroTimeout("connect"));
    }

    if config.timeouts.upstream_secs == Some(0) {
        errors.push(ValidationError::ZeroTimeout("upstream"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// `host:port`, `[v6]:port` or `:port` with a numeric port.
fn is_listen_address(addr: &str) -> bool {
    let Some((host, port)) = addr.rsplit_once(':') else {
        return false;
    };

    if port.parse::<u16>().is_err() {
        return false;
    }

    if host.starts_with('[') {
        return host.ends_with(']') && host.len() > 2;
    }

    !host.contains(':') && !host.chars().any(char::is_whitespace)
}
