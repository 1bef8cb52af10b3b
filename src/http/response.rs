//! Response handling.
//!
//! # Responsibilities
//! - Hand the upstream response to the client with hop-by-hop headers removed
//! - Map relay failures to gateway error responses
//!
//! # Design Decisions
//! - The upstream body is passed through as a stream, never collected
//! - Every upstream failure (refused, timeout, malformed) is a 502

use axum::body::Body;
use axum::http::{Response, StatusCode};
use axum::response::IntoResponse;

use crate::http::headers;

/// The upstream's response, ready for the client.
pub fn relay(upstream: Response<Body>) -> axum::response::Response {
    let (mut parts, body) = upstream.into_parts();
    headers::strip_hop_by_hop(&mut parts.headers);
    Response::from_parts(parts, body)
}

/// Response sent when no upstream response could be obtained.
pub fn bad_gateway() -> axum::response::Response {
    (StatusCode::BAD_GATEWAY, "Bad Gateway").into_response()
}
