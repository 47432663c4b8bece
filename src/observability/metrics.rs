//! Metrics collection and exposition.
//!
//! # Metrics
//! - `alerter_ticks_total` (counter): ticks by outcome (`evaluated`, `dropped`, `stale`)
//! - `alerter_fetch_duration_seconds` (histogram): counter fetch latency
//! - `alerter_alert_state` (gauge): 0=OK, 1=PENDING, 2=FIRING, 3=RESOLVED
//! - `alerter_notifications_total` (counter): deliveries by sink and result

use std::net::SocketAddr;
use std::time::Instant;
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

use crate::evaluator::AlertState;

/// Install the Prometheus recorder and its HTTP listener.
///
/// Must be called from inside a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

pub fn record_tick(outcome: &'static str) {
    metrics::counter!("alerter_ticks_total", "outcome" => outcome).increment(1);
}

pub fn record_fetch_duration(started: Instant) {
    metrics::histogram!("alerter_fetch_duration_seconds").record(started.elapsed().as_secs_f64());
}

pub fn record_alert_state(alert: &str, state: AlertState) {
    metrics::gauge!("alerter_alert_state", "alert" => alert.to_string()).set(state.as_gauge());
}

pub fn record_notification(sink: &str, result: &'static str) {
    metrics::counter!(
        "alerter_notifications_total",
        "sink" => sink.to_string(),
        "result" => result
    )
    .increment(1);
}
