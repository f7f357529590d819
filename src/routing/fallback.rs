//! Primary/legacy transport selection.
//!
//! # Responsibilities
//! - Pick the transport for a submission according to `TransportMode`
//! - Fall back to the other implementation when the preferred one is unusable
//!
//! # Design Decisions
//! - Decided once per submission, never per attempt; the choice travels with
//!   the queue entry through every retry
//! - Availability is explicit (`Transport::is_available`), not inferred from a failed call

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::config::TransportMode;
use crate::error::{RequestError, RequestResult};
use crate::transport::Transport;

/// Chooses between the primary and legacy transport.
pub struct FallbackRouter {
    primary: Arc<dyn Transport>,
    legacy: Arc<dyn Transport>,
    mode: TransportMode,
    fallback_logged: AtomicBool,
}

impl FallbackRouter {
    pub fn new(primary: Arc<dyn Transport>, legacy: Arc<dyn Transport>, mode: TransportMode) -> Self {
        Self {
            primary,
            legacy,
            mode,
            fallback_logged: AtomicBool::new(false),
        }
    }

    pub fn mode(&self) -> TransportMode {
        self.mode
    }

    /// Transport bound to one submission.
    pub fn select(&self) -> RequestResult<Arc<dyn Transport>> {
        let (preferred, other) = match self.mode {
            TransportMode::Auto | TransportMode::Primary => (&self.primary, &self.legacy),
            TransportMode::Legacy => (&self.legacy, &self.primary),
        };

        if preferred.is_available() {
            return Ok(Arc::clone(preferred));
        }

        if other.is_available() {
            if !self.fallback_logged.swap(true, Ordering::Relaxed) {
                tracing::warn!(
                    mode = ?self.mode,
                    preferred = preferred.name(),
                    fallback = other.name(),
                    "Preferred transport unavailable, falling back"
                );
            }
            return Ok(Arc::clone(other));
        }

        Err(RequestError::Network(
            "no transport is configured; set transport.endpoint or transport.legacy_endpoint".into(),
        ))
    }
}

impl std::fmt::Debug for FallbackRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FallbackRouter")
            .field("primary", &self.primary.name())
            .field("legacy", &self.legacy.name())
            .field("mode", &self.mode)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use async_trait::async_trait;

    use crate::credentials::CredentialToken;
    use crate::queue::request::Request;
    use crate::transport::ApiResponse;

    struct Stub {
        name: &'static str,
        available: bool,
    }

    #[async_trait]
    impl Transport for Stub {
        fn name(&self) -> &'static str {
            self.name
        }

        fn is_available(&self) -> bool {
            self.available
        }

        async fn call(
            &self,
            _request: &Request,
            _token: &CredentialToken,
            _timeout: Duration,
        ) -> RequestResult<ApiResponse> {
            Ok(ApiResponse::ok(serde_json::Value::Null))
        }
    }

    fn router(primary: bool, legacy: bool, mode: TransportMode) -> FallbackRouter {
        FallbackRouter::new(
            Arc::new(Stub { name: "primary", available: primary }),
            Arc::new(Stub { name: "legacy", available: legacy }),
            mode,
        )
    }

    #[test]
    fn test_auto_prefers_primary() {
        assert_eq!(router(true, true, TransportMode::Auto).select().unwrap().name(), "primary");
        assert_eq!(router(false, true, TransportMode::Auto).select().unwrap().name(), "legacy");
    }

    #[test]
    fn test_forced_modes() {
        assert_eq!(router(true, true, TransportMode::Legacy).select().unwrap().name(), "legacy");
        assert_eq!(router(true, true, TransportMode::Primary).select().unwrap().name(), "primary");
        // Forced choice still falls back when unusable
        assert_eq!(router(true, false, TransportMode::Legacy).select().unwrap().name(), "primary");
    }

    #[test]
    fn test_nothing_available() {
        let err = router(false, false, TransportMode::Auto).select().err().expect("expected error");
        assert!(matches!(err, RequestError::Network(_)));
    }
}
