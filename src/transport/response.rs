//! Response envelope and classification.
//!
//! The backend answers `{success, data?, error?, retryable?}`. A body with
//! `success: false` is an application error whatever the HTTP status was.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{RequestError, RequestResult};

const MESSAGE_LIMIT: usize = 200;

/// Response body contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Set by the backend when a failed operation is safe to repeat.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retryable: Option<bool>,
}

impl ApiResponse {
    pub fn ok(data: Value) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            retryable: None,
        }
    }
}

/// Turn an HTTP status and body into the envelope or a classified error.
///
/// `timeout` is only used to label a 408.
pub fn classify_response(status: u16, body: &str, timeout: Duration) -> RequestResult<ApiResponse> {
    let parsed = serde_json::from_str::<ApiResponse>(body).ok();

    if let Some(response) = &parsed {
        if !response.success {
            return Err(RequestError::Application {
                message: response
                    .error
                    .clone()
                    .unwrap_or_else(|| "request was not successful".to_string()),
                retryable: response.retryable.unwrap_or(false),
                data: response.data.clone(),
            });
        }
    }

    match status {
        200..=299 => parsed.ok_or_else(|| RequestError::Application {
            message: format!("malformed response body: {}", truncate(body)),
            retryable: false,
            data: None,
        }),
        408 => Err(RequestError::Timeout(timeout)),
        429 | 500..=599 => Err(RequestError::Server {
            status,
            message: truncate(body),
        }),
        _ => Err(RequestError::Client {
            status,
            message: truncate(body),
        }),
    }
}

/// Map a reqwest failure onto the taxonomy.
pub fn map_reqwest_error(error: reqwest::Error, timeout: Duration) -> RequestError {
    if error.is_timeout() {
        RequestError::Timeout(timeout)
    } else if error.is_builder() {
        RequestError::Client {
            status: 0,
            message: error.to_string(),
        }
    } else {
        RequestError::Network(error.to_string())
    }
}

fn truncate(body: &str) -> String {
    let trimmed = body.trim();
    match trimmed.char_indices().nth(MESSAGE_LIMIT) {
        Some((idx, _)) => format!("{}...", &trimmed[..idx]),
        None => trimmed.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use serde_json::json;

    const T: Duration = Duration::from_secs(15);

    #[test]
    fn test_success_envelope() {
        let response = classify_response(200, r#"{"success":true,"data":{"id":4}}"#, T).unwrap();
        assert_eq!(response.data, Some(json!({"id": 4})));
    }

    #[test]
    fn test_success_false_beats_status() {
        for status in [200, 400, 500] {
            let err = classify_response(status, r#"{"success":false,"error":"duplicate"}"#, T)
                .unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Application, "status {}", status);
            assert!(!err.is_retryable());
            assert_eq!(err.to_string(), "application error: duplicate");
        }
    }

    #[test]
    fn test_retryable_flag_in_body() {
        let err = classify_response(200, r#"{"success":false,"retryable":true}"#, T).unwrap_err();
        assert!(err.is_retryable());
    }

    #[test]
    fn test_status_classes() {
        assert_eq!(classify_response(503, "down", T).unwrap_err().kind(), ErrorKind::Server);
        assert_eq!(classify_response(429, "", T).unwrap_err().kind(), ErrorKind::Server);
        assert_eq!(classify_response(404, "missing", T).unwrap_err().kind(), ErrorKind::Client);
        assert_eq!(classify_response(408, "", T).unwrap_err().kind(), ErrorKind::Timeout);
    }

    #[test]
    fn test_malformed_success_body() {
        let err = classify_response(200, "<html>login</html>", T).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Application);
        assert!(err.to_string().contains("<html>"));
    }

    #[test]
    fn test_long_message_truncated() {
        let body = "x".repeat(1000);
        match classify_response(500, &body, T).unwrap_err() {
            RequestError::Server { message, .. } => assert_eq!(message.len(), MESSAGE_LIMIT + 3),
            other => panic!("unexpected {:?}", other),
        }
    }
}
