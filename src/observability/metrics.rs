//! Prometheus metrics for the submitter.
//!
//! # Metrics
//! - `submitter_attempts_total` (counter): broadcast attempts
//! - `submitter_outcomes_total` (counter): terminal results by `outcome`
//! - `submitter_classifications_total` (counter): classifier decisions by `action`
//! - `submitter_monitor_value` (gauge): 1 = true, 0 = false, by `monitor`

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};
use std::net::SocketAddr;

/// Install the global recorder and serve `/metrics` on `addr`.
///
/// Must run inside a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

pub fn record_attempt() {
    metrics::counter!("submitter_attempts_total").increment(1);
}

pub fn record_outcome(outcome: &'static str) {
    metrics::counter!("submitter_outcomes_total", "outcome" => outcome).increment(1);
}

pub fn record_classification(action: &'static str) {
    metrics::counter!("submitter_classifications_total", "action" => action).increment(1);
}

pub fn record_monitor_value(monitor: &'static str, value: bool) {
    metrics::gauge!("submitter_monitor_value", "monitor" => monitor)
        .set(if value { 1.0 } else { 0.0 });
}
