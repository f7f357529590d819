//! Request error taxonomy.
//!
//! Every attempt outcome is classified into one of these kinds. The retry
//! decision in `resilience::retries` is a pure function over [`ErrorKind`].

use std::time::Duration;

use serde_json::Value;
use thiserror::Error;

/// Classification of a failed attempt or request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Deadline exceeded.
    Timeout,
    /// Connection could not be established or was broken.
    Network,
    /// 5xx-equivalent (also 429).
    Server,
    /// 4xx-equivalent.
    Client,
    /// Body said `success: false`.
    Application,
    /// Caller withdrew the request, or the client shut down.
    Cancelled,
    /// No usable credential token.
    Credential,
}

impl ErrorKind {
    /// Stable label used in logs and metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Timeout => "timeout",
            ErrorKind::Network => "network",
            ErrorKind::Server => "server",
            ErrorKind::Client => "client",
            ErrorKind::Application => "application",
            ErrorKind::Cancelled => "cancelled",
            ErrorKind::Credential => "credential",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors surfaced to callers of the client.
#[derive(Debug, Clone, Error)]
pub enum RequestError {
    /// The attempt did not complete within its deadline.
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    /// Connection-level failure.
    #[error("network error: {0}")]
    Network(String),

    /// Backend answered with a server-side failure status.
    #[error("server error ({status}): {message}")]
    Server { status: u16, message: String },

    /// Backend rejected the request itself.
    #[error("client error ({status}): {message}")]
    Client { status: u16, message: String },

    /// Backend processed the request and reported `success: false`.
    #[error("application error: {message}")]
    Application {
        message: String,
        retryable: bool,
        data: Option<Value>,
    },

    /// Request was withdrawn before dispatch.
    #[error("request cancelled: {0}")]
    Cancelled(String),

    /// No credential token could be obtained.
    #[error("credential error: {0}")]
    Credential(String),
}

impl RequestError {
    /// Kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            RequestError::Timeout(_) => ErrorKind::Timeout,
            RequestError::Network(_) => ErrorKind::Network,
            RequestError::Server { .. } => ErrorKind::Server,
            RequestError::Client { .. } => ErrorKind::Client,
            RequestError::Application { .. } => ErrorKind::Application,
            RequestError::Cancelled(_) => ErrorKind::Cancelled,
            RequestError::Credential(_) => ErrorKind::Credential,
        }
    }

    /// Whether another attempt may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            RequestError::Timeout(_) | RequestError::Network(_) | RequestError::Server { .. } => {
                true
            }
            RequestError::Application { retryable, .. } => *retryable,
            RequestError::Client { .. }
            | RequestError::Cancelled(_)
            | RequestError::Credential(_) => false,
        }
    }
}

/// Result type for client operations.
pub type RequestResult<T> = Result<T, RequestError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_kinds() {
        assert!(RequestError::Timeout(Duration::from_secs(1)).is_retryable());
        assert!(RequestError::Network("refused".into()).is_retryable());
        assert!(RequestError::Server { status: 503, message: String::new() }.is_retryable());
        assert!(!RequestError::Client { status: 404, message: String::new() }.is_retryable());
        assert!(!RequestError::Cancelled("withdrawn".into()).is_retryable());
        assert!(!RequestError::Credential("empty".into()).is_retryable());
    }

    #[test]
    fn test_application_error_flag() {
        let plain = RequestError::Application {
            message: "duplicate key".into(),
            retryable: false,
            data: None,
        };
        assert!(!plain.is_retryable());
        assert_eq!(plain.kind(), ErrorKind::Application);

        let flagged = RequestError::Application {
            message: "lock held".into(),
            retryable: true,
            data: None,
        };
        assert!(flagged.is_retryable());
    }

    #[test]
    fn test_error_display() {
        let err = RequestError::Server { status: 502, message: "bad gateway".into() };
        assert_eq!(err.to_string(), "server error (502): bad gateway");
        assert_eq!(ErrorKind::Timeout.to_string(), "timeout");
    }
}
