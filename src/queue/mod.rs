//! Request queueing subsystem.
//!
//! # Data Flow
//! ```text
//! ApiClient::enqueue
//!     → request.rs (resolve options into a Request)
//!     → entry.rs (QueueEntry + Ticket pair)
//!     → pending.rs (priority FIFO)
//!     → dispatcher.rs (single drain loop → RetryPolicy → settle)
//!     → Ticket::settled() resolves for the caller
//! ```
//!
//! # Design Decisions
//! - High priority jumps normal entries but never other high entries
//! - Queue is behind a mutex; the runtime is multi-threaded
//! - Settling consumes the entry, so every request settles exactly once

pub mod dispatcher;
pub mod entry;
pub mod pending;
pub mod request;

pub use dispatcher::{Dispatcher, DispatcherState};
pub use entry::{QueueEntry, Settlement, Ticket};
pub use pending::RequestQueue;
pub use request::{Payload, Priority, Request, RequestId, RequestOptions};
