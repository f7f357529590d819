//! Admin API client: ordered, retrying, credential-aware request scheduling.
//!
//! # Architecture Overview
//!
//! ```text
//!   caller ──submit──▶ ApiClient ──select──▶ FallbackRouter (primary | legacy)
//!                          │
//!                          ▼
//!                    RequestQueue (high tier, then FIFO)
//!                          │
//!                          ▼
//!                    Dispatcher (one in flight, inter-request delay)
//!                          │
//!                          ▼
//!                    RetryPolicy ──token──▶ CredentialProvider
//!                          │
//!                          ▼
//!                    Transport::call ──▶ backend {operation, credential_token, ...}
//!                          │
//!   caller ◀──Settlement───┘
//! ```

// Core subsystems
pub mod client;
pub mod config;
pub mod credentials;
pub mod error;
pub mod queue;
pub mod routing;
pub mod transport;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;
pub mod resilience;

pub use client::{ApiClient, ApiClientBuilder};
pub use config::ClientConfig;
pub use credentials::SessionStore;
pub use error::{ErrorKind, RequestError, RequestResult};
pub use lifecycle::Shutdown;
pub use queue::{Payload, Priority, RequestId, RequestOptions, Settlement, Ticket};
