//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Define portal metrics (requests, latency, security rejections, logins)
//! - Expose a Prometheus-compatible scrape endpoint when enabled
//!
//! # Metrics
//! - `portal_requests_total` (counter): requests by method, status
//! - `portal_request_duration_seconds` (histogram): latency distribution
//! - `portal_csrf_rejections_total` (counter): CSRF rejections by reason
//! - `portal_gate_redirects_total` (counter): gate redirects by gate
//! - `portal_logins_total` (counter): login attempts by outcome
//! - `portal_active_sessions` (gauge): sessions held by the store
//!
//! # Design Decisions
//! - Recording is a no-op until an exporter is installed
//! - No path label: unbounded cardinality from user-supplied URLs

use std::net::SocketAddr;
use std::time::Instant;

use ::metrics::{counter, gauge, histogram};
use axum::{extract::Request, middleware::Next, response::Response};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the global recorder and spawn the scrape listener.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

pub fn record_request(method: &str, status: u16, start: Instant) {
    let labels = [
        ("method", method.to_string()),
        ("status", status.to_string()),
    ];
    counter!("portal_requests_total", &labels).increment(1);
    histogram!("portal_request_duration_seconds", &labels).record(start.elapsed().as_secs_f64());
}

pub fn record_csrf_rejection(reason: &'static str) {
    counter!("portal_csrf_rejections_total", "reason" => reason).increment(1);
}

pub fn record_gate_redirect(gate: &'static str) {
    counter!("portal_gate_redirects_total", "gate" => gate).increment(1);
}

pub fn record_login(outcome: &'static str) {
    counter!("portal_logins_total", "outcome" => outcome).increment(1);
}

pub fn record_active_sessions(count: usize) {
    gauge!("portal_active_sessions").set(count as f64);
}

/// Middleware recording request count and latency.
pub async fn track_requests(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().to_string();
    let response = next.run(request).await;
    record_request(&method, response.status().as_u16(), start);
    response
}
