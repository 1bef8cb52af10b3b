//! Upstream subsystem: the single backend the relay forwards to.
//!
//! # Data Flow
//! ```text
//! rewritten outbound request (http://PROXY_ADDR/PREFIX+path)
//!     → client.rs (Forward::forward, pooled HTTP/1 client)
//!     → upstream response head + streaming body, or UpstreamError
//! ```
//!
//! # Design Decisions
//! - Exactly one attempt per request; no retries, no fallback target
//! - Connect and response-head deadlines come from `TimeoutConfig`
//! - Bodies are never buffered in either direction

pub mod client;

pub use client::{Forward, HttpForwarder, UpstreamError};
