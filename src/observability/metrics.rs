//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gateway_configurations_total` (counter): submissions by outcome
//! - `gateway_services_mounted` (gauge): registered services
//! - `gateway_proxy_requests_total` (counter): proxied requests by service, status
//! - `gateway_proxy_request_duration_seconds` (histogram): upstream latency by service
//!
//! Recording is a no-op until [`init_metrics`] installs the exporter.

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter listening on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => {
            tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter")
        }
    }
}

pub fn record_configuration(outcome: &'static str) {
    metrics::counter!("gateway_configurations_total", "outcome" => outcome).increment(1);
}

pub fn set_services_mounted(count: usize) {
    metrics::gauge!("gateway_services_mounted").set(count as f64);
}

pub fn record_proxy_request(service: &str, status: u16, start: Instant) {
    metrics::counter!(
        "gateway_proxy_requests_total",
        "service" => service.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    metrics::histogram!(
        "gateway_proxy_request_duration_seconds",
        "service" => service.to_string()
    )
    .record(start.elapsed().as_secs_f64());
}
