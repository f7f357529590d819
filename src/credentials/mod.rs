//! Credential subsystem.
//!
//! # Data Flow
//! ```text
//! Before every transport attempt:
//!     provider.rs checks, in order:
//!         configured token (config file, hot-swappable)
//!         → ambient SessionStore (written by the host app)
//!         → environment variable
//!         → generated fallback (warns once per session)
//!     → CredentialToken attached to the outbound call
//! ```
//!
//! # Security Constraints
//! - Token values are never logged
//! - Tokens are read, never written, by the request path

pub mod provider;
pub mod types;

pub use provider::CredentialProvider;
pub use types::{CredentialToken, SessionStore, TokenSource};
