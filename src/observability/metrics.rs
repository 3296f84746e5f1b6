//! Metrics collection and exposition.
//!
//! # Metrics
//! - `mvc_requests_total` (counter): dispatched requests by method, status, context
//! - `mvc_request_duration_seconds` (histogram): dispatch latency
//! - `mvc_render_duration_seconds` (histogram): view render latency
//! - `mvc_template_cache_total` (counter): compiled-template lookups by result
//! - `mvc_bound_handlers` (gauge): handlers bound per kind
//!
//! # Design Decisions
//! - Recording is a no-op until an exporter is installed, so tests and
//!   embedders pay nothing
//! - Labels are limited to low-cardinality values; the handler context is
//!   the route pattern owner, never the concrete path

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Installs the Prometheus recorder and its scrape endpoint on `addr`.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

pub fn record_request(method: &str, status: u16, context: &str, start: Instant) {
    let method = method.to_string();
    let status = status.to_string();
    let context = context.to_string();
    metrics::counter!(
        "mvc_requests_total",
        "method" => method.clone(),
        "status" => status.clone(),
        "context" => context.clone()
    )
    .increment(1);
    metrics::histogram!(
        "mvc_request_duration_seconds",
        "method" => method,
        "status" => status,
        "context" => context
    )
    .record(start.elapsed().as_secs_f64());
}

pub fn record_render(start: Instant) {
    metrics::histogram!("mvc_render_duration_seconds").record(start.elapsed().as_secs_f64());
}

pub fn record_cache_lookup(hit: bool) {
    let result = if hit { "hit" } else { "miss" };
    metrics::counter!("mvc_template_cache_total", "result" => result).increment(1);
}

pub fn record_bound_handlers(kind: &'static str, count: usize) {
    metrics::gauge!("mvc_bound_handlers", "kind" => kind).set(count as f64);
}
