//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (hyper HTTP/1 codec, Axum router, trace layer)
//!     → request.rs (rewrite target to http://upstream/prefix+path)
//!     → headers.rs (strip hop-by-hop, X-Forwarded-*)
//!     → upstream::Forward (single attempt)
//!     → response.rs (relay upstream response, or 502)
//!     → Send to client
//! ```

pub mod headers;
pub mod request;
pub mod response;
pub mod server;

pub use request::X_REQUEST_ID;
pub use server::RelayServer;
