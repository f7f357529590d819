//! Client facade.
//!
//! # Data Flow
//! ```text
//! caller
//!     → ApiClient::submit / enqueue
//!     → FallbackRouter::select (once per submission)
//!     → Dispatcher (queued) or immediate task (bypass)
//!     → RetryPolicy → Transport (fresh credential each attempt)
//!     → Settlement back to the caller's Ticket
//! ```

pub mod facade;

pub use facade::{ApiClient, ApiClientBuilder};
