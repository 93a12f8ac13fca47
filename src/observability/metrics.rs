//! Metrics collection and exposition.
//!
//! # Metrics
//! - `interceptor_requests_total` (counter): requests by method, status, outcome
//! - `interceptor_request_duration_seconds` (histogram): latency distribution
//! - `interceptor_handshake_total` (counter): handshake frames by action
//!
//! # Design Decisions
//! - Low-overhead updates (atomic operations under the hood)
//! - Outcome label distinguishes mocked responses from passthrough
//! - Exposition is optional; recording without an exporter is a no-op

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => {
            describe_counter!(
                "interceptor_requests_total",
                "Intercepted requests by method, status and outcome"
            );
            describe_histogram!(
                "interceptor_request_duration_seconds",
                "Time from interception to resolution"
            );
            describe_counter!(
                "interceptor_handshake_total",
                "Handshake frames handled by action"
            );
            tracing::info!(address = %addr, "Metrics exporter listening");
        }
        Err(error) => {
            tracing::error!(address = %addr, error = %error, "Failed to install metrics exporter");
        }
    }
}

/// Record one resolved interception.
pub fn record_request(method: &str, status: u16, outcome: &str, start: Instant) {
    counter!(
        "interceptor_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string(),
        "outcome" => outcome.to_string(),
    )
    .increment(1);

    histogram!(
        "interceptor_request_duration_seconds",
        "method" => method.to_string(),
        "outcome" => outcome.to_string(),
    )
    .record(start.elapsed().as_secs_f64());
}

/// Record one handled handshake frame.
pub fn record_handshake(action: &str) {
    counter!("interceptor_handshake_total", "action" => action.to_string()).increment(1);
}
