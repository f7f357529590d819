//! Legacy transport: form-encoded POST.
//!
//! Older backend entry points only read `application/x-www-form-urlencoded`
//! fields. String values are sent as-is; everything else is JSON-encoded into
//! its field.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use url::Url;

use crate::credentials::CredentialToken;
use crate::error::{RequestError, RequestResult};
use crate::queue::request::{Payload, Request};
use crate::transport::response::{classify_response, map_reqwest_error, ApiResponse};
use crate::transport::{parse_endpoint, resolve_url, Transport};

/// Posts the request body as form fields.
#[derive(Debug, Clone)]
pub struct LegacyFormTransport {
    client: Client,
    endpoint: Option<Url>,
    credential_header: String,
}

impl LegacyFormTransport {
    pub fn new(client: Client, endpoint: Option<&str>, credential_header: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: parse_endpoint("legacy", endpoint),
            credential_header: credential_header.into(),
        }
    }
}

/// Flatten the body into form pairs, preserving key order.
pub fn form_fields(body: &Payload) -> Vec<(String, String)> {
    body.iter()
        .map(|(key, value)| {
            let field = match value {
                Value::String(s) => s.clone(),
                Value::Null => String::new(),
                other => other.to_string(),
            };
            (key.clone(), field)
        })
        .collect()
}

#[async_trait]
impl Transport for LegacyFormTransport {
    fn name(&self) -> &'static str {
        "legacy_form"
    }

    fn is_available(&self) -> bool {
        self.endpoint.is_some()
    }

    async fn call(
        &self,
        request: &Request,
        token: &CredentialToken,
        timeout: Duration,
    ) -> RequestResult<ApiResponse> {
        let endpoint = self
            .endpoint
            .as_ref()
            .ok_or_else(|| RequestError::Network("legacy transport has no endpoint".into()))?;
        let url = resolve_url(endpoint, request.target_resource.as_deref())?;
        let fields = form_fields(&request.to_body(&token.value));

        let response = self
            .client
            .post(url)
            .header(self.credential_header.as_str(), token.value.as_str())
            .timeout(timeout)
            .form(&fields)
            .send()
            .await
            .map_err(|e| map_reqwest_error(e, timeout))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| map_reqwest_error(e, timeout))?;

        classify_response(status, &body, timeout)
    }
}
