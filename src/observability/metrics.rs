//! Metrics collection and exposition.
//!
//! # Metrics
//! - `client_requests_submitted_total` (counter): submissions by priority
//! - `client_attempts_total` (counter): transport attempts by outcome
//! - `client_requests_settled_total` (counter): settlements by outcome
//! - `client_request_duration_seconds` (histogram): submit-to-settle latency
//! - `client_queue_depth` (gauge): entries waiting for dispatch
//! - `client_credential_fallback_total` (counter): generated-token fallbacks
//!
//! Recording is a no-op until a recorder is installed.

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter on `addr`. Needs a running tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_submitted(priority: &'static str) {
    counter!("client_requests_submitted_total", "priority" => priority).increment(1);
}

pub fn record_attempt(outcome: &'static str) {
    counter!("client_attempts_total", "outcome" => outcome).increment(1);
}

/// Record a settlement and its total latency.
pub fn record_settled(outcome: &'static str, submitted_at: Instant) {
    counter!("client_requests_settled_total", "outcome" => outcome).increment(1);
    histogram!("client_request_duration_seconds", "outcome" => outcome)
        .record(submitted_at.elapsed().as_secs_f64());
}

pub fn record_queue_depth(depth: usize) {
    gauge!("client_queue_depth").set(depth as f64);
}

pub fn record_credential_fallback() {
    counter!("client_credential_fallback_total").increment(1);
}
