//! forwarding-relay
//!
//! ```text
//!     Client ──▶ net::Listener ──▶ http::server ──▶ request rewrite ──▶ upstream::Forward ──▶ Upstream
//!     Client ◀── response relay ◀──────────────────────────────────────────────────────────┘
//! ```
//!
//! Reads `BIND_ADDR`, `PROXY_ADDR` and `PROXY_PATH` once, then serves until
//! SIGINT/SIGTERM. A configuration or bind failure exits non-zero.

use forwarding_relay::config;
use forwarding_relay::lifecycle::Shutdown;
use forwarding_relay::net::Listener;
use forwarding_relay::observability::{logging, metrics};
use forwarding_relay::RelayServer;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init();

    let config = config::load_from_env()?;

    tracing::info!(
        bind_address = %config.listener.bind_address,
        upstream = %config.upstream.authority,
        path_prefix = %config.upstream.path_prefix,
        "Configuration loaded"
    );

    if let Some(addr) = &config.observability.metrics_address {
        metrics::init_metrics(addr.parse()?)?;
    }

    let listener = Listener::bind(&config.listener).await?;

    let shutdown = Shutdown::new();
    shutdown.trigger_on_signal();

    let server = RelayServer::new(config);
    server.run(listener, shutdown.subscribe()).await?;

    Ok(())
}
