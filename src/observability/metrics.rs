//! Metrics collection and exposition.
//!
//! # Metrics
//! - `contact_requests_total` (counter): requests by endpoint, status
//! - `contact_request_duration_seconds` (histogram): latency by endpoint
//! - `contact_submissions_total` (counter): accepted submissions, by resume presence
//! - `contact_rate_limited_total` (counter): rejected submission attempts
//! - `contact_upstream_errors_total` (counter): failed collaborator calls
//! - `contact_resume_upload_failures_total` (counter): swallowed upload failures
//!
//! Recording is a no-op until an exporter is installed.

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter with its own HTTP listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(endpoint: &'static str, status: u16, start: Instant) {
    counter!("contact_requests_total", "endpoint" => endpoint, "status" => status.to_string())
        .increment(1);
    histogram!("contact_request_duration_seconds", "endpoint" => endpoint)
        .record(start.elapsed().as_secs_f64());
}

pub fn record_submission(with_resume: bool) {
    counter!("contact_submissions_total", "resume" => if with_resume { "yes" } else { "no" })
        .increment(1);
}

pub fn record_rate_limited() {
    counter!("contact_rate_limited_total").increment(1);
}

pub fn record_upstream_error(collaborator: &'static str) {
    counter!("contact_upstream_errors_total", "collaborator" => collaborator).increment(1);
}

pub fn record_resume_upload_failure() {
    counter!("contact_resume_upload_failures_total").increment(1);
}
