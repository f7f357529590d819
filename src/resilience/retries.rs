//! Retry logic.
//!
//! # Responsibilities
//! - Re-acquire the credential token before every attempt
//! - Enforce the attempt timeout around each transport call
//! - Decide, per failure, whether to retry and after how long
//! - Record every attempt
//!
//! # Design Decisions
//! - The decision is a pure function over the classified error
//! - Timeout, network and server errors retry; client, credential and
//!   cancellation errors never do; application errors only when flagged
//! - On exhaustion the last error is surfaced, not the first

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tokio::time::Instant;

use crate::config::RequestDefaults;
use crate::credentials::CredentialProvider;
use crate::error::{ErrorKind, RequestError, RequestResult};
use crate::observability::metrics;
use crate::queue::entry::Settlement;
use crate::queue::request::Request;
use crate::resilience::backoff::Backoff;
use crate::resilience::timeouts::{attempt_budget, with_timeout};
use crate::transport::{ApiResponse, Transport};

/// Outcome of a single attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptOutcome {
    Success,
    Failure(ErrorKind),
}

impl AttemptOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttemptOutcome::Success => "success",
            AttemptOutcome::Failure(kind) => kind.as_str(),
        }
    }
}

/// One transport attempt.
#[derive(Debug, Clone)]
pub struct AttemptRecord {
    /// 1-based attempt number.
    pub index: u32,
    pub started_at: Instant,
    pub duration: Duration,
    pub transport: &'static str,
    pub outcome: AttemptOutcome,
    pub error: Option<RequestError>,
}

impl AttemptRecord {
    fn new<T>(
        index: u32,
        started_at: Instant,
        transport: &'static str,
        result: &RequestResult<T>,
    ) -> Self {
        let (outcome, error) = match result {
            Ok(_) => (AttemptOutcome::Success, None),
            Err(e) => (AttemptOutcome::Failure(e.kind()), Some(e.clone())),
        };
        Self {
            index,
            started_at,
            duration: started_at.elapsed(),
            transport,
            outcome,
            error,
        }
    }
}

/// What to do after a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    Retry(Duration),
    GiveUp,
}

/// Decide whether failed attempt `attempt` (1-based) is followed by another.
pub fn decide(error: &RequestError, attempt: u32, max_retries: u32, backoff: &Backoff) -> RetryDecision {
    if !error.is_retryable() || attempt > max_retries {
        return RetryDecision::GiveUp;
    }
    RetryDecision::Retry(backoff.delay(attempt))
}

/// Executes a request through its transport with bounded retries.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    credentials: Arc<CredentialProvider>,
    max_delay: Duration,
    jitter_ratio: f64,
}

impl RetryPolicy {
    pub fn new(credentials: Arc<CredentialProvider>, defaults: &RequestDefaults) -> Self {
        Self {
            credentials,
            max_delay: Duration::from_millis(defaults.max_retry_delay_ms),
            jitter_ratio: defaults.jitter_ratio,
        }
    }

    fn backoff_for(&self, request: &Request) -> Backoff {
        Backoff {
            base: request.retry_delay,
            max: self.max_delay.max(request.retry_delay),
            jitter_ratio: self.jitter_ratio,
        }
    }

    /// Run attempts until success, a terminal error, or exhaustion.
    pub async fn execute(&self, request: &Request, transport: &dyn Transport) -> Settlement {
        let started = Instant::now();
        let backoff = self.backoff_for(request);
        let mut attempts = Vec::new();
        let mut last_error: Option<RequestError> = None;
        let mut attempt = 0u32;

        loop {
            attempt += 1;

            let budget = match attempt_budget(request.timeout, request.deadline, started.elapsed()) {
                Some(budget) => budget,
                None => {
                    let error = last_error.unwrap_or_else(|| {
                        RequestError::Timeout(request.deadline.unwrap_or(request.timeout))
                    });
                    tracing::warn!(
                        request_id = %request.id,
                        action = %request.action,
                        attempts = attempts.len(),
                        "Request deadline exhausted"
                    );
                    return settlement(request, Err(error), attempts);
                }
            };

            let attempt_started = Instant::now();
            let result = self.attempt(request, transport, budget).await;
            let record = AttemptRecord::new(attempt, attempt_started, transport.name(), &result);
            metrics::record_attempt(record.outcome.as_str());
            attempts.push(record);

            let error = match result {
                Ok(response) => {
                    if attempt > 1 {
                        tracing::info!(
                            request_id = %request.id,
                            action = %request.action,
                            attempt,
                            "Request succeeded after retry"
                        );
                    }
                    return settlement(request, Ok(response.data.unwrap_or(Value::Null)), attempts);
                }
                Err(error) => error,
            };

            match decide(&error, attempt, request.max_retries, &backoff) {
                RetryDecision::Retry(delay) => {
                    tracing::warn!(
                        request_id = %request.id,
                        action = %request.action,
                        attempt,
                        delay = ?delay,
                        error = %error,
                        "Retrying request"
                    );
                    last_error = Some(error);
                    tokio::time::sleep(delay).await;
                }
                RetryDecision::GiveUp => {
                    tracing::error!(
                        request_id = %request.id,
                        action = %request.action,
                        attempt,
                        kind = %error.kind(),
                        error = %error,
                        "Request failed"
                    );
                    return settlement(request, Err(error), attempts);
                }
            }
        }
    }

    async fn attempt(
        &self,
        request: &Request,
        transport: &dyn Transport,
        budget: Duration,
    ) -> RequestResult<ApiResponse> {
        // Tokens rotate out-of-band, so every attempt reads a fresh one.
        let token = self.credentials.get_token()?;
        tracing::debug!(
            request_id = %request.id,
            transport = transport.name(),
            token_source = token.source.as_str(),
            timeout = ?budget,
            "Dispatching attempt"
        );
        with_timeout(budget, transport.call(request, &token, budget)).await
    }
}

fn settlement(
    request: &Request,
    result: RequestResult<Value>,
    attempts: Vec<AttemptRecord>,
) -> Settlement {
    Settlement {
        request_id: request.id,
        result,
        attempts,
    }
}
