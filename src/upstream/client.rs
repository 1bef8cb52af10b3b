//! Upstream dispatch.
//!
//! [`Forward`] is the seam between the relay handler and the network: it
//! takes a fully rewritten outbound request and returns the upstream's
//! response head with a streaming body. [`HttpForwarder`] is the production
//! implementation on top of hyper-util's pooled client.

use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, Response};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};

use crate::config::TimeoutConfig;

/// Why an upstream round-trip produced no response.
#[derive(Debug, thiserror::Error)]
pub enum UpstreamError {
    /// Connection refused, DNS failure or connect timeout.
    #[error("upstream connection failed: {0}")]
    Connect(#[source] hyper_util::client::legacy::Error),

    /// No response head before the configured deadline.
    #[error("upstream did not respond within {0:?}")]
    Timeout(Duration),

    /// The connection broke or the upstream sent something that is not HTTP.
    #[error("upstream request failed: {0}")]
    Request(#[source] hyper_util::client::legacy::Error),
}

impl UpstreamError {
    /// Short label used for metrics and log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            UpstreamError::Connect(_) => "connect",
            UpstreamError::Timeout(_) => "timeout",
            UpstreamError::Request(_) => "request",
        }
    }
}

impl From<hyper_util::client::legacy::Error> for UpstreamError {
    fn from(err: hyper_util::client::legacy::Error) -> Self {
        if err.is_connect() {
            UpstreamError::Connect(err)
        } else {
            UpstreamError::Request(err)
        }
    }
}

/// Sends one outbound request to the upstream. Implementations must not
/// retry: one call, one upstream attempt.
#[async_trait]
pub trait Forward: Send + Sync {
    async fn forward(&self, request: Request<Body>) -> Result<Response<Body>, UpstreamError>;
}

/// Plain-HTTP forwarder backed by a pooled hyper client.
#[derive(Clone)]
pub struct HttpForwarder {
    client: Client<HttpConnector, Body>,
    response_timeout: Option<Duration>,
}

impl HttpForwarder {
    pub fn new(timeouts: &TimeoutConfig) -> Self {
        let mut connector = HttpConnector::new();
        connector.set_connect_timeout(Some(timeouts.connect()));
        connector.set_nodelay(true);

        let client = Client::builder(TokioExecutor::new()).build(connector);

        Self {
            client,
            response_timeout: timeouts.upstream(),
        }
    }
}

#[async_trait]
impl Forward for HttpForwarder {
    async fn forward(&self, request: Request<Body>) -> Result<Response<Body>, UpstreamError> {
        let call = self.client.request(request);

        let response = match self.response_timeout {
            Some(limit) => tokio::time::timeout(limit, call)
                .await
                .map_err(|_| UpstreamError::Timeout(limit))??,
            None => call.await?,
        };

        let (parts, body) = response.into_parts();
        Ok(Response::from_parts(parts, Body::new(body)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    fn get(uri: String) -> Request<Body> {
        Request::get(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn refused_connection_is_a_connect_error() {
        // Bind then drop to find a port with nothing listening.
        let addr = TcpListener::bind("127.0.0.1:0").await.unwrap().local_addr().unwrap();

        let forwarder = HttpForwarder::new(&TimeoutConfig::default());
        let err = forwarder.forward(get(format!("http://{addr}/"))).await.unwrap_err();

        assert_eq!(err.kind(), "connect");
    }

    #[tokio::test]
    async fn garbage_response_is_a_request_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 1024];
            let _ = socket.read(&mut buf).await;
            let _ = socket.write_all(b"this is not http\r\n\r\n").await;
            let _ = socket.shutdown().await;
        });

        let forwarder = HttpForwarder::new(&TimeoutConfig::default());
        let err = forwarder.forward(get(format!("http://{addr}/"))).await.unwrap_err();

        assert_eq!(err.kind(), "request");
    }

    #[tokio::test]
    async fn slow_upstream_hits_the_deadline() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (_socket, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(5)).await;
        });

        let timeouts = TimeoutConfig {
            connect_secs: 1,
            upstream_secs: Some(1),
        };
        let forwarder = HttpForwarder::new(&timeouts);
        let err = forwarder.forward(get(format!("http://{addr}/"))).await.unwrap_err();

        assert!(matches!(err, UpstreamError::Timeout(d) if d == Duration::from_secs(1)));
    }
}
