//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Ctrl-C / embedding application
//!     → Shutdown::trigger
//!     → ApiClient::close (via attach_shutdown)
//!     → queued requests settle as cancelled, in-flight request finishes
//! ```

pub mod shutdown;

pub use shutdown::Shutdown;
