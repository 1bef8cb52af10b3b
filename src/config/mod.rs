//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! process environment (BIND_ADDR, PROXY_ADDR, PROXY_PATH, ...)
//!     → loader.rs (read once, apply defaults)
//!     → validation.rs (semantic checks)
//!     → RelayConfig (validated, immutable)
//!     → shared via Arc with the request handlers
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require a restart
//! - Every field has a default so an empty environment is a valid config
//! - Request handling never reads the environment

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_from_env, load_with, ConfigError};
pub use schema::{ListenerConfig, ObservabilityConfig, RelayConfig, TimeoutConfig, UpstreamConfig};
pub use validation::ValidationError;
