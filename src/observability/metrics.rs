//! Metrics collection and exposition.
//!
//! # Metrics
//! - `redirect_requests_total` (counter): channel requests by outcome
//! - `channel_mutations_total` (counter): create/update/verify by result
//! - `store_operation_duration_seconds` (histogram): store call latency by op
//! - `store_retries_total` (counter): retried store reads by op

use metrics::{counter, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};
use std::net::SocketAddr;
use std::time::Instant;

/// Install the Prometheus recorder and its scrape listener.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

/// Outcome of a channel request: `redirect`, `challenge`, `not_found`, `error`.
pub fn record_redirect(outcome: &'static str) {
    counter!("redirect_requests_total", "outcome" => outcome).increment(1);
}

pub fn record_mutation(op: &'static str, result: &'static str) {
    counter!("channel_mutations_total", "op" => op, "result" => result).increment(1);
}

pub fn record_store_operation(op: &'static str, start: Instant) {
    histogram!("store_operation_duration_seconds", "op" => op)
        .record(start.elapsed().as_secs_f64());
}

pub fn record_store_retry(op: &'static str) {
    counter!("store_retries_total", "op" => op).increment(1);
}
