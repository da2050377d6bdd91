//! Metrics collection and exposition.
//!
//! # Metrics
//! - `proxy_requests_total` (counter): requests by method, status, relay mode
//! - `proxy_request_duration_seconds` (histogram): time until response headers
//! - `proxy_upstream_errors_total` (counter): upstream failures by kind
//! - `proxy_body_fields_stripped_total` (counter): removed JSON fields

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Start the Prometheus exporter on `addr`. Must run inside the Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;

    describe_counter!("proxy_requests_total", "Requests relayed, by method, status and mode");
    describe_histogram!(
        "proxy_request_duration_seconds",
        "Time from request receipt to response headers"
    );
    describe_counter!("proxy_upstream_errors_total", "Upstream failures by kind");
    describe_counter!(
        "proxy_body_fields_stripped_total",
        "JSON fields removed from request bodies"
    );

    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

pub fn record_request(method: &str, status: u16, mode: &'static str, start: Instant) {
    counter!(
        "proxy_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string(),
        "mode" => mode
    )
    .increment(1);

    histogram!(
        "proxy_request_duration_seconds",
        "method" => method.to_string(),
        "mode" => mode
    )
    .record(start.elapsed().as_secs_f64());
}

pub fn record_upstream_error(kind: &'static str) {
    counter!("proxy_upstream_errors_total", "kind" => kind).increment(1);
}

pub fn record_stripped_field(field: &str) {
    counter!("proxy_body_fields_stripped_total", "field" => field.to_string()).increment(1);
}
