//! Metrics collection and exposition.
//!
//! # Metrics
//! - `topic_publish_total` (counter): publish attempts by outcome
//! - `topic_fanout_deliveries_total` (counter): enqueues issued by fan-out
//! - `topic_bindings` (gauge): current number of bindings
//! - `topic_validation_failures_total` (counter): rejected input by rule

use std::net::SocketAddr;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Outcome label for `topic_publish_total`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishOutcome {
    /// At least one queue received the message.
    Routed,
    /// The key was valid but no binding matched.
    Unrouted,
    /// The request was rejected before routing.
    Rejected,
    /// An enqueue failed part-way through fan-out.
    Failed,
}

impl PublishOutcome {
    fn as_str(self) -> &'static str {
        match self {
            PublishOutcome::Routed => "routed",
            PublishOutcome::Unrouted => "unrouted",
            PublishOutcome::Rejected => "rejected",
            PublishOutcome::Failed => "failed",
        }
    }
}

/// Install the Prometheus exporter listening on `addr`.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_publish(outcome: PublishOutcome) {
    metrics::counter!("topic_publish_total", "outcome" => outcome.as_str()).increment(1);
}

pub fn record_deliveries(count: usize) {
    metrics::counter!("topic_fanout_deliveries_total").increment(count as u64);
}

pub fn record_binding_count(count: usize) {
    metrics::gauge!("topic_bindings").set(count as f64);
}

pub fn record_validation_failure(code: &'static str) {
    metrics::counter!("topic_validation_failures_total", "kind" => code).increment(1);
}
