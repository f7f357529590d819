//! Credential token types.

use std::sync::Arc;
use std::time::Instant;

use arc_swap::ArcSwapOption;

/// Where a token came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenSource {
    /// Explicit configuration (config file or `set_configured`).
    Configured,
    /// Process-wide session store shared with the host application.
    Ambient,
    /// Environment variable.
    Environment,
    /// Generated locally because no upstream source had a value.
    Generated,
}

impl TokenSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenSource::Configured => "configured",
            TokenSource::Ambient => "ambient",
            TokenSource::Environment => "environment",
            TokenSource::Generated => "generated",
        }
    }
}

/// A token as read immediately before one transport call.
#[derive(Clone, PartialEq, Eq)]
pub struct CredentialToken {
    pub value: String,
    pub source: TokenSource,
    pub acquired_at: Instant,
}

impl CredentialToken {
    pub fn new(value: impl Into<String>, source: TokenSource) -> Self {
        Self {
            value: value.into(),
            source,
            acquired_at: Instant::now(),
        }
    }
}

// Token values never reach logs.
impl std::fmt::Debug for CredentialToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialToken")
            .field("value", &"<redacted>")
            .field("source", &self.source)
            .field("acquired_at", &self.acquired_at)
            .finish()
    }
}

/// Shared handle to the ambient session token.
///
/// The host application writes the token it received at login (or after a
/// rotation); the client only reads it.
#[derive(Clone, Default)]
pub struct SessionStore {
    inner: Arc<ArcSwapOption<String>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the session token.
    pub fn set(&self, token: impl Into<String>) {
        self.inner.store(Some(Arc::new(token.into())));
    }

    /// Forget the session token.
    pub fn clear(&self) {
        self.inner.store(None);
    }

    /// Current token, if any.
    pub fn get(&self) -> Option<Arc<String>> {
        self.inner.load_full()
    }
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore")
            .field("present", &self.inner.load().is_some())
            .finish()
    }
}
