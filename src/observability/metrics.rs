//! Metrics collection and exposition.
//!
//! # Metrics
//! - `bootstrap_registrations_total` (counter): register calls by outcome
//! - `bootstrap_deregistrations_total` (counter): deregister calls by outcome
//! - `bootstrap_discovery_lookups_total` (counter): lookups by service, outcome
//! - `bootstrap_requests_total` (counter): served requests by method, status
//! - `bootstrap_request_duration_seconds` (histogram): served request latency
//!
//! Recording is a no-op until an exporter is installed.

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus exporter listening on `addr`.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

pub fn record_registration(success: bool) {
    counter!("bootstrap_registrations_total", "outcome" => outcome(success)).increment(1);
}

pub fn record_deregistration(success: bool) {
    counter!("bootstrap_deregistrations_total", "outcome" => outcome(success)).increment(1);
}

/// `result` is one of `found`, `not_found`, `error`.
pub fn record_discovery(service: &str, result: &'static str) {
    counter!(
        "bootstrap_discovery_lookups_total",
        "service" => service.to_string(),
        "result" => result
    )
    .increment(1);
}

pub fn record_request(method: &str, status: u16, start: Instant) {
    counter!(
        "bootstrap_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    histogram!("bootstrap_request_duration_seconds", "method" => method.to_string())
        .record(start.elapsed().as_secs_f64());
}

fn outcome(success: bool) -> &'static str {
    if success {
        "success"
    } else {
        "failure"
    }
}
