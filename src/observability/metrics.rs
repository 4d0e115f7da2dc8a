//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Define API metrics (requests, latency, connections, source errors)
//! - Expose Prometheus-compatible metrics endpoint
//!
//! # Metrics
//! - `stencil_requests_total` (counter): requests by route, status
//! - `stencil_request_duration_seconds` (histogram): latency by route
//! - `stencil_active_connections` (gauge): current connection count
//! - `stencil_source_errors_total` (counter): backend failures by source
//!
//! # Design Decisions
//! - Recording is a no-op until a recorder is installed
//! - Labels are low-cardinality: route name, never the raw path

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus recorder and its HTTP listener on `addr`.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

/// Record one served request.
pub fn record_request(route: &'static str, status: u16, start: Instant) {
    let labels = [("route", route.to_string()), ("status", status.to_string())];
    metrics::counter!("stencil_requests_total", &labels).increment(1);
    metrics::histogram!("stencil_request_duration_seconds", "route" => route)
        .record(start.elapsed().as_secs_f64());
}

/// Update the in-flight connection gauge.
pub fn set_active_connections(count: u64) {
    metrics::gauge!("stencil_active_connections").set(count as f64);
}

/// Record a backend failure.
pub fn record_source_error(source: &str) {
    metrics::counter!("stencil_source_errors_total", "source" => source.to_string()).increment(1);
}
