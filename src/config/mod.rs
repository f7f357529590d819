//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! client.toml
//!     → loader.rs (toml → ClientConfig, every section defaulted)
//!     → validation.rs (collects every semantic error, not just the first)
//!     → ApiClient::builder
//!
//! While the CLI runs a batch:
//!     watcher.rs sees the file change
//!     → reload + validate
//!     → published only if credentials.token differs
//!     → CredentialProvider::set_configured
//! ```
//!
//! # Design Decisions
//! - Queue, retry and transport settings are fixed for a client's lifetime
//! - The credential token is the one live setting, because it rotates out-of-band

pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use loader::{load_config, ConfigError};
pub use schema::{
    ClientConfig, CredentialConfig, LogFormat, ObservabilityConfig, QueueConfig, RequestDefaults,
    TransportConfig, TransportMode,
};
