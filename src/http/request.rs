//! Inbound-to-outbound request rewriting.
//!
//! # Responsibilities
//! - Build the upstream URI: `http://{authority}{prefix}{path}[?query]`
//! - Carry method, headers and body over to the outbound request
//! - Produce a correlation id for log lines
//!
//! # Design Decisions
//! - The inbound path loses its leading `/` and is appended to the prefix
//!   with no separator handling: `/svc` + `/users/1` is `/svcusers/1`,
//!   `/api` + `/x` is `/apix`, `/` + `/x` is `/x`. An empty prefix leaves
//!   the path untouched.
//! - Bytes not allowed in a path (space, `"`, `#`, `<`, `>`, `?`, `` ` ``,
//!   `{`, `}`, controls, non-ASCII) are percent-encoded, so any prefix
//!   yields a valid target.
//! - The body is moved, never buffered

use std::net::SocketAddr;

use axum::body::Body;
use axum::extract::ConnectInfo;
use axum::http::{request::Parts, Request, Uri, Version};
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use tower_http::request_id::{MakeRequestId, MakeRequestUuid};

use crate::config::UpstreamConfig;
use crate::http::headers;

/// Header a caller may use to supply its own correlation id.
pub const X_REQUEST_ID: &str = "x-request-id";

/// Characters escaped when they appear in the rewritten path.
const PATH_ESCAPE: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Failure to turn an inbound request into an upstream one.
#[derive(Debug, thiserror::Error)]
pub enum RewriteError {
    #[error("rewritten target {target:?} is not a valid request URI: {source}")]
    InvalidTarget {
        target: String,
        #[source]
        source: axum::http::Error,
    },
}

/// Id used to correlate log lines for one request.
///
/// The caller's `x-request-id` when it sent one, otherwise a fresh UUID.
/// Only logged; the relayed messages are not touched.
pub fn correlation_id<B>(request: &Request<B>) -> String {
    if let Some(id) = request
        .headers()
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
    {
        return id.to_owned();
    }

    MakeRequestUuid
        .make_request_id(request)
        .and_then(|id| id.header_value().to_str().ok().map(str::to_owned))
        .unwrap_or_else(|| "-".to_owned())
}

/// Join the configured prefix with the inbound path and keep the query.
pub fn rewrite_path(prefix: &str, inbound: &Uri) -> String {
    let path = if prefix.is_empty() {
        inbound.path()
    } else {
        inbound.path().strip_prefix('/').unwrap_or(inbound.path())
    };

    let mut joined = String::with_capacity(prefix.len() + path.len() + 1);
    if !prefix.starts_with('/') && !path.starts_with('/') {
        joined.push('/');
    }
    joined.push_str(prefix);
    joined.push_str(path);

    let mut target: String = utf8_percent_encode(&joined, PATH_ESCAPE).collect();
    if let Some(query) = inbound.query() {
        target.push('?');
        target.push_str(query);
    }
    target
}

/// Absolute URI of the upstream resource for `inbound`.
pub fn upstream_uri(upstream: &UpstreamConfig, inbound: &Uri) -> Result<Uri, RewriteError> {
    let target = rewrite_path(&upstream.path_prefix, inbound);

    let built = Uri::builder()
        .scheme("http")
        .authority(upstream.authority.as_str())
        .path_and_query(target.as_str())
        .build();

    built.map_err(|source| RewriteError::InvalidTarget { target, source })
}

/// Turn the inbound request into the request sent upstream.
///
/// Only the method, headers and body survive; extensions and the protocol
/// version are reset for the upstream hop.
pub fn build_outbound(
    parts: Parts,
    body: Body,
    upstream: &UpstreamConfig,
) -> Result<Request<Body>, RewriteError> {
    let uri = upstream_uri(upstream, &parts.uri)?;
    let client = parts
        .extensions
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip());

    let mut forwarded = parts.headers;
    headers::prepare_outbound(&mut forwarded, client);

    let mut outbound = Request::new(body);
    *outbound.method_mut() = parts.method;
    *outbound.uri_mut() = uri;
    *outbound.version_mut() = Version::HTTP_11;
    *outbound.headers_mut() = forwarded;

    Ok(outbound)
}
