//! Primary transport: JSON body over HTTP POST.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use url::Url;

use crate::credentials::CredentialToken;
use crate::error::{RequestError, RequestResult};
use crate::queue::request::Request;
use crate::transport::response::{classify_response, map_reqwest_error, ApiResponse};
use crate::transport::{parse_endpoint, resolve_url, Transport};

/// Posts `{operation, credential_token, ...payload}` as JSON.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    endpoint: Option<Url>,
    credential_header: String,
}

impl HttpTransport {
    pub fn new(client: Client, endpoint: Option<&str>, credential_header: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: parse_endpoint("primary", endpoint),
            credential_header: credential_header.into(),
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    fn name(&self) -> &'static str {
        "http"
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
            .ok_or_else(|| RequestError::Network("primary transport has no endpoint".into()))?;
        let url = resolve_url(endpoint, request.target_resource.as_deref())?;

        let response = self
            .client
            .post(url)
            .header(self.credential_header.as_str(), token.value.as_str())
            .header(reqwest::header::ACCEPT, "application/json")
            .timeout(timeout)
            .json(&request.to_body(&token.value))
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
