//! Metrics collection and exposition.
//!
//! # Metrics
//! - `relay_requests_total` (counter): requests by route, method, status
//! - `relay_request_duration_seconds` (histogram): time to response head
//! - `relay_upload_bytes_total` (counter): bytes staged by uploads
//! - `relay_staged_files_evicted_total` (counter): files removed by retention
//!
//! # Design Decisions
//! - Exporter is opt-in; without it the macros record into a no-op recorder
//! - Route label is the route kind, never the raw path

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Serve Prometheus metrics on `addr`. Must be called inside a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

pub fn record_request(route: &'static str, method: &str, status: u16, start: Instant) {
    let labels = [
        ("route", route.to_string()),
        ("method", method.to_string()),
        ("status", status.to_string()),
    ];
    counter!("relay_requests_total", &labels).increment(1);
    histogram!("relay_request_duration_seconds", &labels[..2]).record(start.elapsed().as_secs_f64());
}

pub fn record_upload(bytes: u64) {
    counter!("relay_upload_bytes_total").increment(bytes);
}

pub fn record_evictions(count: usize) {
    if count > 0 {
        counter!("relay_staged_files_evicted_total").increment(count as u64);
    }
}
