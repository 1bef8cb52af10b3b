//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the relay.
//! Every section has a `Default` matching the values used when the
//! corresponding environment variable is unset.

use std::time::Duration;

/// Default listen address: all interfaces, port 8090.
pub const DEFAULT_BIND_ADDRESS: &str = ":8090";

/// Default upstream authority.
pub const DEFAULT_UPSTREAM_AUTHORITY: &str = "127.0.0.1:8080";

/// Default path prefix.
pub const DEFAULT_PATH_PREFIX: &str = "/";

/// Root configuration for the forwarding relay.
///
/// Built once at startup and never mutated afterwards; the server holds it
/// behind an `Arc` and hands out shared references to request handlers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RelayConfig {
    /// Listener configuration (bind address, connection limit).
    pub listener: ListenerConfig,

    /// The single upstream target.
    pub upstream: UpstreamConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListenerConfig {
    /// Bind address (e.g., ":8090" or "127.0.0.1:8090").
    pub bind_address: String,

    /// Maximum concurrent connections (backpressure).
    pub max_connections: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: DEFAULT_BIND_ADDRESS.to_string(),
            max_connections: 10_000,
        }
    }
}

impl ListenerConfig {
    /// The address handed to the socket layer.
    ///
    /// An empty host (":8090") means every IPv4 interface. Unlike a Go
    /// `:8090` listener this does not also accept IPv6; use `[::]:8090` for
    /// that.
    pub fn socket_address(&self) -> String {
        if self.bind_address.starts_with(':') {
            format!("0.0.0.0{}", self.bind_address)
        } else {
            self.bind_address.clone()
        }
    }
}

/// Upstream target configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamConfig {
    /// `host:port` of the backend.
    pub authority: String,

    /// Prefix prepended verbatim to every inbound path.
    pub path_prefix: String,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            authority: DEFAULT_UPSTREAM_AUTHORITY.to_string(),
            path_prefix: DEFAULT_PATH_PREFIX.to_string(),
        }
    }
}

/// Timeout configuration for upstream calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeoutConfig {
    /// Upstream connection establishment timeout in seconds.
    pub connect_secs: u64,

    /// Deadline for the upstream response head, in seconds. `None` waits
    /// for as long as the upstream takes.
    pub upstream_secs: Option<u64>,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_secs: 30,
            upstream_secs: None,
        }
    }
}

impl TimeoutConfig {
    pub fn connect(&self) -> Duration {
        Duration::from_secs(self.connect_secs)
    }

    pub fn upstream(&self) -> Option<Duration> {
        self.upstream_secs.map(Duration::from_secs)
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObservabilityConfig {
    /// Prometheus endpoint bind address. Metrics export is off when unset.
    pub metrics_address: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = RelayConfig::default();
        assert_eq!(config.listener.bind_address, ":8090");
        assert_eq!(config.upstream.authority, "127.0.0.1:8080");
        assert_eq!(config.upstream.path_prefix, "/");
        assert_eq!(config.timeouts.upstream(), None);
        assert!(config.observability.metrics_address.is_none());
    }

    #[test]
    fn port_only_bind_address_listens_everywhere() {
        let listener = ListenerConfig::default();
        assert_eq!(listener.socket_address(), "0.0.0.0:8090");

        let listener = ListenerConfig {
            bind_address: "127.0.0.1:9000".into(),
            ..Default::default()
        };
        assert_eq!(listener.socket_address(), "127.0.0.1:9000");
    }

    #[test]
    fn port_only_bind_address_is_ipv4_and_v6_must_be_explicit() {
        let listener = ListenerConfig {
            bind_address: ":8090".into(),
            ..Default::default()
        };
        assert!(listener.socket_address().parse::<std::net::SocketAddr>().unwrap().is_ipv4());

        let listener = ListenerConfig {
            bind_address: "[::]:8090".into(),
            ..Default::default()
        };
        assert_eq!(listener.socket_address(), "[::]:8090");
    }
}
