//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Dispatched request:
//!     → retries.rs (loop over attempts, pure retry decision)
//!     → timeouts.rs (per-attempt deadline, total budget)
//!     → On retryable failure: backoff.rs (base * 2^(n-1), capped, optional jitter)
//! ```
//!
//! # Design Decisions
//! - Timeouts are non-negotiable; every attempt has a deadline
//! - Retries are per request; the transport choice does not change between attempts
//! - The last error wins on exhaustion

pub mod backoff;
pub mod retries;
pub mod timeouts;
