//! Credential token lookup.
//!
//! # Responsibilities
//! - Resolve the freshest token from the configured sources, in priority order
//! - Fall back to a locally generated token when every source is empty
//! - Warn once per session when the generated fallback is used
//!
//! # Design Decisions
//! - Lookup runs before every transport call; nothing upstream is cached
//! - The generated token is stable for the session so the backend sees one value
//! - Blank values count as absent

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

use arc_swap::ArcSwapOption;
use uuid::Uuid;

use crate::config::CredentialConfig;
use crate::credentials::types::{CredentialToken, SessionStore, TokenSource};
use crate::error::{RequestError, RequestResult};
use crate::observability::metrics;

/// Supplies the token attached to each outbound call.
pub struct CredentialProvider {
    configured: ArcSwapOption<String>,
    session: SessionStore,
    env_var: String,
    allow_generated: bool,
    generated: OnceLock<String>,
    fallback_warned: AtomicBool,
}

impl CredentialProvider {
    /// Create a provider from configuration and the host's session store.
    pub fn new(config: &CredentialConfig, session: SessionStore) -> Self {
        Self {
            configured: ArcSwapOption::from(config.token.clone().map(Arc::new)),
            session,
            env_var: config.env_var.clone(),
            allow_generated: config.allow_generated_fallback,
            generated: OnceLock::new(),
            fallback_warned: AtomicBool::new(false),
        }
    }

    /// Replace the explicitly configured token (e.g. after a config reload).
    pub fn set_configured(&self, token: Option<String>) {
        self.configured.store(token.map(Arc::new));
    }

    /// Whether the generated fallback has been used in this session.
    pub fn fallback_used(&self) -> bool {
        self.fallback_warned.load(Ordering::Relaxed)
    }

    /// Resolve the freshest token.
    pub fn get_token(&self) -> RequestResult<CredentialToken> {
        if let Some(token) = non_blank(self.configured.load_full().as_deref().map(String::as_str)) {
            return Ok(CredentialToken::new(token, TokenSource::Configured));
        }

        if let Some(token) = non_blank(self.session.get().as_deref().map(String::as_str)) {
            return Ok(CredentialToken::new(token, TokenSource::Ambient));
        }

        let from_env = std::env::var(&self.env_var).ok();
        if let Some(token) = non_blank(from_env.as_deref()) {
            return Ok(CredentialToken::new(token, TokenSource::Environment));
        }

        if !self.allow_generated {
            return Err(RequestError::Credential(format!(
                "no token in configuration, session store or ${}",
                self.env_var
            )));
        }

        if !self.fallback_warned.swap(true, Ordering::Relaxed) {
            metrics::record_credential_fallback();
            tracing::warn!(
                env_var = %self.env_var,
                "No credential token available, using a generated token; the upstream session is likely broken"
            );
        }

        let token = self
            .generated
            .get_or_init(|| Uuid::new_v4().simple().to_string());
        Ok(CredentialToken::new(token.clone(), TokenSource::Generated))
    }
}

impl std::fmt::Debug for CredentialProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialProvider")
            .field("env_var", &self.env_var)
            .field("allow_generated", &self.allow_generated)
            .field("fallback_used", &self.fallback_used())
            .finish()
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(env_var: &str) -> CredentialConfig {
        CredentialConfig {
            token: None,
            env_var: env_var.to_string(),
            allow_generated_fallback: true,
        }
    }

    #[test]
    fn test_source_priority() {
        let env_var = "ADMIN_CLIENT_TEST_PRIORITY_TOKEN";
        std::env::set_var(env_var, "from-env");

        let session = SessionStore::new();
        let provider = CredentialProvider::new(&config(env_var), session.clone());
        assert_eq!(provider.get_token().unwrap().source, TokenSource::Environment);

        session.set("from-session");
        let token = provider.get_token().unwrap();
        assert_eq!(token.source, TokenSource::Ambient);
        assert_eq!(token.value, "from-session");

        provider.set_configured(Some("from-config".into()));
        let token = provider.get_token().unwrap();
        assert_eq!(token.source, TokenSource::Configured);
        assert_eq!(token.value, "from-config");

        std::env::remove_var(env_var);
    }

    #[test]
    fn test_rotation_is_observed() {
        let session = SessionStore::new();
        let provider =
            CredentialProvider::new(&config("ADMIN_CLIENT_TEST_ROTATION_TOKEN"), session.clone());

        session.set("first");
        assert_eq!(provider.get_token().unwrap().value, "first");
        session.set("second");
        assert_eq!(provider.get_token().unwrap().value, "second");
    }

    #[test]
    fn test_blank_values_are_skipped() {
        let session = SessionStore::new();
        session.set("   ");
        let mut cfg = config("ADMIN_CLIENT_TEST_BLANK_TOKEN");
        cfg.token = Some(String::new());

        let provider = CredentialProvider::new(&cfg, session);
        assert_eq!(provider.get_token().unwrap().source, TokenSource::Generated);
    }

    #[test]
    fn test_generated_fallback_is_stable() {
        let provider = CredentialProvider::new(
            &config("ADMIN_CLIENT_TEST_GENERATED_TOKEN"),
            SessionStore::new(),
        );
        assert!(!provider.fallback_used());

        let first = provider.get_token().unwrap();
        let second = provider.get_token().unwrap();
        assert_eq!(first.source, TokenSource::Generated);
        assert_eq!(first.value, second.value);
        assert_eq!(first.value.len(), 32);
        assert!(provider.fallback_used());
    }

    #[test]
    fn test_fallback_disabled() {
        let mut cfg = config("ADMIN_CLIENT_TEST_DISABLED_TOKEN");
        cfg.allow_generated_fallback = false;
        let provider = CredentialProvider::new(&cfg, SessionStore::new());

        let err = provider.get_token().unwrap_err();
        assert!(matches!(err, RequestError::Credential(_)));
        assert!(!err.is_retryable());
    }
}
