//! Single-upstream HTTP forwarding relay.
//!
//! Every inbound request is sent to one fixed upstream with a configured
//! prefix prepended to its path, and the upstream's response is streamed back.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod upstream;

pub use config::RelayConfig;
pub use http::RelayServer;
pub use lifecycle::Shutdown;
pub use upstream::{Forward, HttpForwarder, UpstreamError};
