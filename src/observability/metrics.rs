//! Metrics collection and exposition.
//!
//! # Metrics
//! - `search_requests_total` (counter): view requests by view, status
//! - `search_request_duration_seconds` (histogram): view latency
//! - `search_upstream_requests_total` (counter): provider calls by status
//! - `search_upstream_duration_seconds` (histogram): provider latency
//! - `search_cache_lookups_total` (counter): cache hits / misses
//! - `search_errors_total` (counter): failed requests by error kind
//! - `search_rejections_total` (counter): guard / rate-limit rejections by check
//!
//! Recording is a no-op until a recorder is installed.

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::time::Instant;

/// Install the Prometheus recorder and its scrape endpoint.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

/// Record a finished view request.
pub fn record_request(view: &str, status: u16, start: Instant) {
    counter!(
        "search_requests_total",
        "view" => view.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    histogram!("search_request_duration_seconds", "view" => view.to_string())
        .record(start.elapsed().as_secs_f64());
}

/// Record one provider call.
pub fn record_upstream_request(status: u16, start: Instant) {
    counter!("search_upstream_requests_total", "status" => status.to_string()).increment(1);
    histogram!("search_upstream_duration_seconds").record(start.elapsed().as_secs_f64());
}

/// Record a response cache lookup.
pub fn record_cache_lookup(hit: bool) {
    let outcome = if hit { "hit" } else { "miss" };
    counter!("search_cache_lookups_total", "outcome" => outcome).increment(1);
}

/// Record a failed search request.
pub fn record_search_error(kind: &'static str) {
    counter!("search_errors_total", "kind" => kind).increment(1);
}

/// Record a request turned away before reaching a view.
pub fn record_rejection(check: &'static str) {
    counter!("search_rejections_total", "check" => check).increment(1);
}
