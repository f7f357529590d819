//! Transport subsystem.
//!
//! # Data Flow
//! ```text
//! RetryPolicy attempt
//!     → Transport::call(request, fresh token, attempt timeout)
//!         http.rs   (primary: JSON POST)
//!         legacy.rs (legacy: form POST)
//!     → response.rs (status + body → ApiResponse or classified error)
//! ```
//!
//! # Design Decisions
//! - One trait, two implementations, chosen by configuration
//! - Timeouts are distinct from network errors
//! - `success: false` bodies are application errors regardless of status

pub mod http;
pub mod legacy;
pub mod response;

use std::time::Duration;

use async_trait::async_trait;
use url::Url;

use crate::credentials::CredentialToken;
use crate::error::{RequestError, RequestResult};
use crate::queue::request::Request;

pub use http::HttpTransport;
pub use legacy::LegacyFormTransport;
pub use response::{classify_response, ApiResponse};

/// Executes one outbound call.
///
/// Implementations must be cancel-safe: the future may be dropped when the
/// attempt deadline passes.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Short name for logs and metrics.
    fn name(&self) -> &'static str;

    /// Whether this implementation is configured well enough to be used.
    fn is_available(&self) -> bool;

    /// Perform one attempt.
    async fn call(
        &self,
        request: &Request,
        token: &CredentialToken,
        timeout: Duration,
    ) -> RequestResult<ApiResponse>;
}

/// Shared reqwest client for both transports.
pub fn build_http_client(connect_timeout: Duration) -> RequestResult<reqwest::Client> {
    reqwest::Client::builder()
        .connect_timeout(connect_timeout)
        .build()
        .map_err(|e| RequestError::Network(format!("failed to build HTTP client: {}", e)))
}

/// Parse an optional endpoint; invalid values make the transport unavailable.
pub(crate) fn parse_endpoint(label: &str, raw: Option<&str>) -> Option<Url> {
    let raw = raw?;
    match Url::parse(raw) {
        Ok(url) => Some(url),
        Err(e) => {
            tracing::warn!(transport = label, endpoint = %raw, error = %e, "Ignoring invalid endpoint");
            None
        }
    }
}

/// Endpoint, or endpoint joined with the request's target resource.
///
/// The joined URL must keep the endpoint's scheme, host and port; the
/// credential token is never sent to another origin.
pub(crate) fn resolve_url(endpoint: &Url, target: Option<&str>) -> RequestResult<Url> {
    let Some(target) = target else {
        return Ok(endpoint.clone());
    };

    let invalid = |reason: String| RequestError::Client {
        status: 0,
        message: format!("invalid target resource '{}': {}", target, reason),
    };

    let joined = endpoint.join(target).map_err(|e| invalid(e.to_string()))?;
    let same_origin = joined.scheme() == endpoint.scheme()
        && joined.host_str() == endpoint.host_str()
        && joined.port_or_known_default() == endpoint.port_or_known_default();
    if !same_origin {
        return Err(invalid("points outside the configured endpoint".into()));
    }
    Ok(joined)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_url() {
        let base = Url::parse("https://admin.example.com/api/").unwrap();
        assert_eq!(resolve_url(&base, None).unwrap().as_str(), "https://admin.example.com/api/");
        assert_eq!(
            resolve_url(&base, Some("keys/list")).unwrap().as_str(),
            "https://admin.example.com/api/keys/list"
        );
    }

    #[test]
    fn test_resolve_url_stays_on_endpoint_origin() {
        let base = Url::parse("https://admin.example.com/api/").unwrap();
        for target in [
            "https://other.example.net/steal",
            "//other.example.net/steal",
            "http://admin.example.com/api/keys",
            "https://admin.example.com:8443/api/keys",
        ] {
            let err = resolve_url(&base, Some(target)).unwrap_err();
            assert!(
                matches!(err, RequestError::Client { status: 0, .. }),
                "target {} was accepted",
                target
            );
        }

        assert_eq!(
            resolve_url(&base, Some("https://admin.example.com:443/api/keys"))
                .unwrap()
                .as_str(),
            "https://admin.example.com/api/keys"
        );
        assert_eq!(
            resolve_url(&base, Some("/other/path")).unwrap().as_str(),
            "https://admin.example.com/other/path"
        );
    }

    #[test]
    fn test_parse_endpoint() {
        assert!(parse_endpoint("primary", None).is_none());
        assert!(parse_endpoint("primary", Some("::nope")).is_none());
        assert!(parse_endpoint("primary", Some("http://127.0.0.1:9000/")).is_some());
    }
}
