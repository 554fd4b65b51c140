//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gateway_requests_total` (counter): requests by method, status
//! - `gateway_request_duration_seconds` (histogram): latency distribution
//! - `waf_blocked_total` (counter): signature blocks by category
//! - `waf_rate_limited_total` (counter): 429 rejections
//! - `waf_allowlist_rejected_total` (counter): allowlist rejections
//! - `proxy_upstream_total` (counter): upstream outcomes
//!   (relayed, timeout, unreachable, error)
//! - `proxy_map_errors_total` (counter): unreadable/invalid proxy map reads
//!
//! # Design Decisions
//! - Recording is unconditional and cheap; without an installed exporter the
//!   macros are no-ops, so tests and embedded uses need no setup

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter on its own listener. Call once, from
/// `main`, inside the runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(method: &str, status: u16, start: Instant) {
    counter!(
        "gateway_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    histogram!("gateway_request_duration_seconds").record(start.elapsed().as_secs_f64());
}

pub fn record_blocked(category: &str) {
    counter!("waf_blocked_total", "category" => category.to_string()).increment(1);
}

pub fn record_rate_limited() {
    counter!("waf_rate_limited_total").increment(1);
}

pub fn record_allowlist_rejected() {
    counter!("waf_allowlist_rejected_total").increment(1);
}

pub fn record_upstream(outcome: &'static str) {
    counter!("proxy_upstream_total", "outcome" => outcome).increment(1);
}

pub fn record_map_error() {
    counter!("proxy_map_errors_total").increment(1);
}
