//! Metrics collection and exposition.
//!
//! # Metrics
//! - `proxy_requests_total` (counter): connections handled, by outcome
//! - `proxy_cache_hits_total` / `proxy_cache_misses_total` (counters)
//! - `proxy_cache_evictions_total` (counter): entries removed by LRU pressure
//! - `proxy_cache_bytes` / `proxy_cache_entries` (gauges): current usage
//! - `proxy_active_connections` (gauge): handlers currently running
//!
//! # Design Decisions
//! - Recording goes through the `metrics` facade and is a no-op until a
//!   recorder is installed, so the cache and handlers never check a flag

use std::net::SocketAddr;

use metrics::{counter, gauge};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter listening on `addr`.
///
/// Failure to start the exporter is logged, not fatal; the proxy keeps
/// serving without metrics.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

/// Count one handled connection by outcome label.
pub fn record_request(outcome: &'static str) {
    counter!("proxy_requests_total", "outcome" => outcome).increment(1);
}

pub fn record_cache_hit() {
    counter!("proxy_cache_hits_total").increment(1);
}

pub fn record_cache_miss() {
    counter!("proxy_cache_misses_total").increment(1);
}

/// Count entries evicted by one insert's LRU pass.
pub fn record_evictions(count: usize) {
    if count > 0 {
        counter!("proxy_cache_evictions_total").increment(count as u64);
    }
}

/// Publish current cache usage.
pub fn record_cache_usage(total_bytes: usize, entries: usize) {
    gauge!("proxy_cache_bytes").set(total_bytes as f64);
    gauge!("proxy_cache_entries").set(entries as f64);
}

/// Publish the number of in-flight connection handlers.
pub fn record_active_connections(count: u64) {
    gauge!("proxy_active_connections").set(count as f64);
}
