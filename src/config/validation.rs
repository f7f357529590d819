//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, jitter within bounds)
//! - Check that at least one transport endpoint is usable
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ClientConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use url::Url;

use crate::config::schema::ClientConfig;

/// A single semantic problem with a configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path of the offending field.
    pub field: String,
    /// Human-readable explanation.
    pub message: String,
}

impl ValidationError {
    fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate a parsed configuration.
pub fn validate_config(config: &ClientConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let transport = &config.transport;
    if transport.endpoint.is_none() && transport.legacy_endpoint.is_none() {
        errors.push(ValidationError::new(
            "transport",
            "at least one of endpoint or legacy_endpoint must be set",
        ));
    }
    for (field, value) in [
        ("transport.endpoint", &transport.endpoint),
        ("transport.legacy_endpoint", &transport.legacy_endpoint),
    ] {
        if let Some(raw) = value {
            if let Err(message) = check_endpoint(raw) {
                errors.push(ValidationError::new(field, message));
            }
        }
    }
    if transport.credential_header.trim().is_empty() {
        errors.push(ValidationError::new(
            "transport.credential_header",
            "must not be empty",
        ));
    }

    let requests = &config.requests;
    if requests.timeout_ms == 0 {
        errors.push(ValidationError::new("requests.timeout_ms", "must be greater than 0"));
    }
    if requests.max_retry_delay_ms < requests.retry_delay_ms {
        errors.push(ValidationError::new(
            "requests.max_retry_delay_ms",
            "must be greater than or equal to retry_delay_ms",
        ));
    }
    if !(0.0..=1.0).contains(&requests.jitter_ratio) {
        errors.push(ValidationError::new(
            "requests.jitter_ratio",
            "must be between 0.0 and 1.0",
        ));
    }

    if config.credentials.env_var.trim().is_empty() {
        errors.push(ValidationError::new("credentials.env_var", "must not be empty"));
    }

    if config.observability.metrics_enabled
        && config
            .observability
            .metrics_address
            .parse::<std::net::SocketAddr>()
            .is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            "must be a socket address",
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_endpoint(raw: &str) -> Result<(), String> {
    let url = Url::parse(raw).map_err(|e| format!("invalid URL '{}': {}", raw, e))?;
    match url.scheme() {
        "http" | "https" => Ok(()),
        other => Err(format!("unsupported scheme '{}'", other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> ClientConfig {
        let mut config = ClientConfig::default();
        config.transport.endpoint = Some("https://admin.example.com/api/".into());
        config
    }

    #[test]
    fn test_valid_config_passes() {
        assert!(validate_config(&valid_config()).is_ok());
    }

    #[test]
    fn test_missing_endpoints() {
        let errors = validate_config(&ClientConfig::default()).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "transport");
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = valid_config();
        config.transport.legacy_endpoint = Some("ftp://files.example.com".into());
        config.requests.timeout_ms = 0;
        config.requests.jitter_ratio = 1.5;

        let errors = validate_config(&config).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
        assert!(fields.contains(&"transport.legacy_endpoint"));
        assert!(fields.contains(&"requests.timeout_ms"));
        assert!(fields.contains(&"requests.jitter_ratio"));
    }

    #[test]
    fn test_backoff_cap_below_base() {
        let mut config = valid_config();
        config.requests.retry_delay_ms = 5_000;
        config.requests.max_retry_delay_ms = 1_000;

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors[0].field, "requests.max_retry_delay_ms");
    }
}
