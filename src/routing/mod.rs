//! Transport routing subsystem.
//!
//! # Data Flow
//! ```text
//! submit()
//!     → fallback.rs (mode + availability → one transport)
//!     → transport bound to the QueueEntry
//!     → reused by every retry attempt of that request
//! ```

pub mod fallback;

pub use fallback::FallbackRouter;
