//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! submit / dispatch / attempt / settle / credential fallback
//!     → logging.rs (tracing events keyed by request_id and action)
//!     → metrics.rs (submissions, attempts, settlements, queue depth)
//!
//! The binary installs the subscriber and, when enabled, the Prometheus
//! exporter. Embedding applications bring their own.
//! ```
//!
//! # Design Decisions
//! - The library emits events and metrics but never installs a global subscriber
//! - Credential values never appear in events, only their source
//! - Metric labels are closed sets (priority, outcome)

pub mod logging;
pub mod metrics;
