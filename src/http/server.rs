//! HTTP server setup and the relay handler.
//!
//! # Responsibilities
//! - Build the Axum router: one catch-all handler behind a trace layer
//! - Run the accept loop and serve each connection with hyper's HTTP/1 codec
//! - Rewrite each request and forward it through the [`Forward`] seam
//! - Drain open connections on shutdown

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::{ConnectInfo, Request, State},
    response::Response,
    Router,
};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper_util::rt::TokioIo;
use tokio::net::TcpStream;
use tokio::sync::broadcast;
use tower::ServiceExt;
use tower_http::trace::TraceLayer;
use tracing::Span;

use crate::config::RelayConfig;
use crate::http::{request, response};
use crate::net::{ConnectionGuard, ConnectionPermit, ConnectionTracker, Listener, ListenerError};
use crate::observability::metrics;
use crate::upstream::{Forward, HttpForwarder};

/// How long shutdown waits for open connections before giving up on them.
pub const DRAIN_TIMEOUT: Duration = Duration::from_secs(30);

/// Pause after a failed accept, so a persistent error (EMFILE) does not spin.
const ACCEPT_ERROR_BACKOFF: Duration = Duration::from_millis(100);

/// Application state injected into the handler.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<RelayConfig>,
    pub forwarder: Arc<dyn Forward>,
}

/// HTTP server for the forwarding relay.
pub struct RelayServer {
    router: Router,
    config: Arc<RelayConfig>,
    tracker: ConnectionTracker,
}

impl RelayServer {
    /// Create a server forwarding over plain HTTP to the configured upstream.
    pub fn new(config: RelayConfig) -> Self {
        let forwarder = Arc::new(HttpForwarder::new(&config.timeouts));
        Self::with_forwarder(config, forwarder)
    }

    /// Create a server with a caller-supplied forwarder.
    pub fn with_forwarder(config: RelayConfig, forwarder: Arc<dyn Forward>) -> Self {
        let config = Arc::new(config);
        let state = AppState {
            config: Arc::clone(&config),
            forwarder,
        };

        Self {
            router: Self::build_router(state),
            config,
            tracker: ConnectionTracker::new(),
        }
    }

    fn build_router(state: AppState) -> Router {
        Router::new()
            .fallback(relay_handler)
            .with_state(state)
            .layer(TraceLayer::new_for_http().make_span_with(request_span))
    }

    /// Accept and serve connections until `shutdown` fires, then drain.
    ///
    /// Only a closed listener ends the loop with an error; failed accepts
    /// are logged and retried.
    pub async fn run(
        self,
        listener: Listener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), ListenerError> {
        if let Ok(addr) = listener.local_addr() {
            tracing::info!(
                address = %addr,
                upstream = %self.config.upstream.authority,
                path_prefix = %self.config.upstream.path_prefix,
                "Relay serving"
            );
        }

        loop {
            tokio::select! {
                accepted = listener.accept() => {
                    let (stream, peer, permit) = match accepted {
                        Ok(conn) => conn,
                        Err(ListenerError::Accept(e)) => {
                            tracing::warn!(error = %e, "Accept failed");
                            tokio::time::sleep(ACCEPT_ERROR_BACKOFF).await;
                            continue;
                        }
                        Err(e) => return Err(e),
                    };

                    let guard = self.tracker.track();
                    tokio::spawn(serve_connection(
                        stream,
                        peer,
                        self.router.clone(),
                        guard,
                        permit,
                        shutdown.resubscribe(),
                    ));
                }
                _ = shutdown.recv() => {
                    break;
                }
            }
        }

        tracing::info!(
            open_connections = self.tracker.active_count(),
            "Stopped accepting, draining connections"
        );
        if !self.tracker.drain(DRAIN_TIMEOUT).await {
            tracing::warn!(
                open_connections = self.tracker.active_count(),
                "Drain deadline passed, dropping remaining connections"
            );
        }

        tracing::info!("Relay stopped");
        Ok(())
    }
}

/// Serve HTTP/1 requests on one client connection.
///
/// The peer address is inserted as `ConnectInfo` so the handler can set
/// X-Forwarded-For. Malformed requests are answered by hyper itself.
async fn serve_connection(
    stream: TcpStream,
    peer: SocketAddr,
    router: Router,
    guard: ConnectionGuard,
    _permit: ConnectionPermit,
    mut shutdown: broadcast::Receiver<()>,
) {
    let connection_id = guard.id();
    let service = hyper::service::service_fn(move |mut request: hyper::Request<Incoming>| {
        request.extensions_mut().insert(ConnectInfo(peer));
        router.clone().oneshot(request)
    });

    let conn = http1::Builder::new().serve_connection(TokioIo::new(stream), service);
    tokio::pin!(conn);

    let mut draining = false;
    let result = loop {
        tokio::select! {
            res = conn.as_mut() => break res,
            _ = shutdown.recv(), if !draining => {
                conn.as_mut().graceful_shutdown();
                draining = true;
            }
        }
    };

    if let Err(e) = result {
        tracing::debug!(
            connection_id = %connection_id,
            peer_addr = %peer,
            error = %e,
            "Connection ended with error"
        );
    }
}

/// Span wrapping one relayed request. The correlation id lives here only,
/// so neither the upstream request nor the client response gains a header.
fn request_span(inbound: &Request) -> Span {
    tracing::info_span!(
        "request",
        request_id = %request::correlation_id(inbound),
        method = %inbound.method(),
        uri = %inbound.uri(),
    )
}

/// Forward one request to the upstream and relay the answer.
async fn relay_handler(State(state): State<AppState>, inbound: Request) -> Response {
    let start = Instant::now();
    let method = inbound.method().clone();

    let (parts, body): (_, Body) = inbound.into_parts();
    let inbound_path = parts.uri.path().to_owned();

    let outbound = match request::build_outbound(parts, body, &state.config.upstream) {
        Ok(outbound) => outbound,
        Err(e) => {
            tracing::error!(error = %e, "Cannot build upstream request");
            metrics::record_request(method.as_str(), 502, start);
            return response::bad_gateway();
        }
    };

    tracing::debug!(
        method = %method,
        path = %inbound_path,
        upstream_uri = %outbound.uri(),
        "Forwarding request"
    );

    match state.forwarder.forward(outbound).await {
        Ok(upstream) => {
            let response = response::relay(upstream);
            metrics::record_request(method.as_str(), response.status().as_u16(), start);
            response
        }
        Err(e) => {
            tracing::error!(
                method = %method,
                path = %inbound_path,
                kind = e.kind(),
                error = %e,
                "Upstream error"
            );
            metrics::record_upstream_error(e.kind());
            metrics::record_request(method.as_str(), 502, start);
            response::bad_gateway()
        }
    }
}
