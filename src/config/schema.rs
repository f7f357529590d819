//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the client.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the admin API client.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ClientConfig {
    /// Transport endpoints and selection.
    pub transport: TransportConfig,

    /// Dispatcher pacing.
    pub queue: QueueConfig,

    /// Per-request defaults (timeout, retries, backoff).
    pub requests: RequestDefaults,

    /// Credential token sources.
    pub credentials: CredentialConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Which transport implementation to prefer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TransportMode {
    /// Primary when available, legacy otherwise.
    #[default]
    Auto,
    /// Always primary, legacy only if primary is unusable.
    Primary,
    /// Always legacy, primary only if legacy is unusable.
    Legacy,
}

/// Transport configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TransportConfig {
    /// JSON API endpoint used by the primary transport.
    pub endpoint: Option<String>,

    /// Form-post endpoint used by the legacy transport.
    pub legacy_endpoint: Option<String>,

    /// Transport selection mode.
    pub mode: TransportMode,

    /// Header that also carries the credential token.
    pub credential_header: String,

    /// TCP connect timeout in milliseconds.
    pub connect_timeout_ms: u64,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            legacy_endpoint: None,
            mode: TransportMode::Auto,
            credential_header: "X-CSRF-Token".to_string(),
            connect_timeout_ms: 5_000,
        }
    }
}

/// Dispatcher configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct QueueConfig {
    /// Pause between two dispatched requests in milliseconds.
    pub inter_request_delay_ms: u64,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            inter_request_delay_ms: 100,
        }
    }
}

/// Defaults applied to every submission unless overridden.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RequestDefaults {
    /// Per-attempt timeout in milliseconds.
    pub timeout_ms: u64,

    /// Retries after the first attempt.
    pub max_retries: u32,

    /// Base delay for exponential backoff in milliseconds.
    pub retry_delay_ms: u64,

    /// Maximum delay for exponential backoff in milliseconds.
    pub max_retry_delay_ms: u64,

    /// Random jitter added to each backoff, as a fraction of the delay.
    pub jitter_ratio: f64,
}

impl Default for RequestDefaults {
    fn default() -> Self {
        Self {
            timeout_ms: 15_000,
            max_retries: 3,
            retry_delay_ms: 1_000,
            max_retry_delay_ms: 60_000,
            jitter_ratio: 0.0,
        }
    }
}

/// Credential token sources.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CredentialConfig {
    /// Explicitly configured token (highest priority).
    pub token: Option<String>,

    /// Environment variable consulted after the ambient session store.
    pub env_var: String,

    /// Generate a local token when every source is empty.
    pub allow_generated_fallback: bool,
}

impl Default for CredentialConfig {
    fn default() -> Self {
        Self {
            token: None,
            env_var: "ADMIN_API_CSRF_TOKEN".to_string(),
            allow_generated_fallback: true,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}
