//! Metrics collection and exposition.
//!
//! # Metrics
//! - `relay_requests_total` (counter): relayed requests by method, status
//! - `relay_request_duration_seconds` (histogram): end-to-end latency up to the response head
//! - `relay_upstream_errors_total` (counter): failed upstream round-trips by kind
//! - `relay_active_connections` (gauge): open client connections
//!
//! Recording goes through the `metrics` facade and is a no-op until an
//! exporter is installed with [`init_metrics`].

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

pub const REQUESTS_TOTAL: &str = "relay_requests_total";
pub const REQUEST_DURATION_SECONDS: &str = "relay_request_duration_seconds";
pub const UPSTREAM_ERRORS_TOTAL: &str = "relay_upstream_errors_total";
pub const ACTIVE_CONNECTIONS: &str = "relay_active_connections";

/// Install the Prometheus exporter, serving scrapes on `addr`.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

pub fn record_request(method: &str, status: u16, start: Instant) {
    ::metrics::counter!(
        REQUESTS_TOTAL,
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    ::metrics::histogram!(REQUEST_DURATION_SECONDS).record(start.elapsed().as_secs_f64());
}

pub fn record_upstream_error(kind: &'static str) {
    ::metrics::counter!(UPSTREAM_ERRORS_TOTAL, "kind" => kind).increment(1);
}

pub fn set_active_connections(active: u64) {
    ::metrics::gauge!(ACTIVE_CONNECTIONS).set(active as f64);
}
