//! Request model.

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::config::RequestDefaults;

/// Ordered key/value payload merged into the request body.
pub type Payload = Map<String, Value>;

/// Unique request identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestId(pub Uuid);

impl RequestId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Dispatch priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    High,
    #[default]
    Normal,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::High => "high",
            Priority::Normal => "normal",
        }
    }
}

/// Per-submission overrides. `None` means "use the client default".
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    pub priority: Priority,
    pub timeout: Option<Duration>,
    pub max_retries: Option<u32>,
    pub retry_delay: Option<Duration>,
    /// `false` bypasses the queue and runs immediately.
    pub enqueue: Option<bool>,
    /// Path joined onto the transport endpoint.
    pub target_resource: Option<String>,
    /// Total budget across all attempts.
    pub deadline: Option<Duration>,
}

impl RequestOptions {
    pub fn high() -> Self {
        Self {
            priority: Priority::High,
            ..Self::default()
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = Some(max_retries);
        self
    }

    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = Some(delay);
        self
    }

    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target_resource = Some(target.into());
        self
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn bypass_queue(mut self) -> Self {
        self.enqueue = Some(false);
        self
    }
}

/// A submitted request with every option resolved.
#[derive(Debug, Clone)]
pub struct Request {
    pub id: RequestId,
    pub action: String,
    pub payload: Payload,
    pub priority: Priority,
    pub timeout: Duration,
    pub max_retries: u32,
    pub retry_delay: Duration,
    pub target_resource: Option<String>,
    pub deadline: Option<Duration>,
    /// Queue admission order, stamped by `RequestQueue::enqueue`. Zero for
    /// requests that bypass the queue.
    pub sequence: u64,
    pub submitted_at: Instant,
}

impl Request {
    /// Resolve `options` against the configured defaults.
    pub fn new(
        action: impl Into<String>,
        payload: Payload,
        options: &RequestOptions,
        defaults: &RequestDefaults,
    ) -> Self {
        Self {
            id: RequestId::generate(),
            action: action.into(),
            payload,
            priority: options.priority,
            timeout: options
                .timeout
                .unwrap_or(Duration::from_millis(defaults.timeout_ms)),
            max_retries: options.max_retries.unwrap_or(defaults.max_retries),
            retry_delay: options
                .retry_delay
                .unwrap_or(Duration::from_millis(defaults.retry_delay_ms)),
            target_resource: options.target_resource.clone(),
            deadline: options.deadline,
            sequence: 0,
            submitted_at: Instant::now(),
        }
    }

    /// Wire body: `{operation, credential_token, ...payload}`.
    ///
    /// Payload keys named `operation` or `credential_token` are overridden.
    pub fn to_body(&self, token: &str) -> Payload {
        let mut body = Payload::with_capacity(self.payload.len() + 2);
        body.insert("operation".into(), Value::String(self.action.clone()));
        body.insert("credential_token".into(), Value::String(token.to_string()));
        for (key, value) in &self.payload {
            if key != "operation" && key != "credential_token" {
                body.insert(key.clone(), value.clone());
            }
        }
        body
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload(value: Value) -> Payload {
        match value {
            Value::Object(map) => map,
            _ => Payload::new(),
        }
    }

    #[test]
    fn test_defaults_applied() {
        let defaults = RequestDefaults::default();
        let request = Request::new("list_keys", Payload::new(), &RequestOptions::default(), &defaults);

        assert_eq!(request.priority, Priority::Normal);
        assert_eq!(request.timeout, Duration::from_millis(15_000));
        assert_eq!(request.max_retries, 3);
        assert_eq!(request.retry_delay, Duration::from_millis(1_000));
        assert_eq!(request.sequence, 0);
    }

    #[test]
    fn test_overrides_applied() {
        let options = RequestOptions::high()
            .with_timeout(Duration::from_secs(2))
            .with_max_retries(0)
            .with_target("keys/delete");
        let request = Request::new("delete_key", Payload::new(), &options, &RequestDefaults::default());

        assert_eq!(request.priority, Priority::High);
        assert_eq!(request.timeout, Duration::from_secs(2));
        assert_eq!(request.max_retries, 0);
        assert_eq!(request.target_resource.as_deref(), Some("keys/delete"));
    }

    #[test]
    fn test_body_layout() {
        let request = Request::new(
            "save_listing",
            payload(json!({"title": "Lamp", "price": 12.5, "operation": "spoofed"})),
            &RequestOptions::default(),
            &RequestDefaults::default(),
        );

        let body = request.to_body("tok");
        let keys: Vec<_> = body.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["operation", "credential_token", "title", "price"]);
        assert_eq!(body["operation"], json!("save_listing"));
        assert_eq!(body["credential_token"], json!("tok"));
    }
}
