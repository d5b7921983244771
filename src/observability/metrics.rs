//! Metrics collection and exposition.
//!
//! # Metrics
//! - `monitor_probes_total` (counter): probes by target, result
//! - `monitor_probe_duration_seconds` (histogram): probe latency by target
//! - `monitor_target_up` (gauge): 1=up, 0=down
//! - `monitor_transitions_total` (counter): transitions by target, new status
//! - `monitor_remediations_total` (counter): hook invocations by target, result
//!
//! # Design Decisions
//! - Uses the `metrics` facade; without an installed recorder every call is a no-op
//! - Prometheus exposition is opt-in via `init_metrics`

use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::time::Duration;

use crate::probe::FailureCause;

/// Install the Prometheus recorder and its HTTP listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

/// Record the result and latency of one probe.
pub fn record_probe(target: &str, cause: Option<FailureCause>, latency: Duration) {
    let result = cause.map(|c| c.as_str()).unwrap_or("up");
    metrics::counter!("monitor_probes_total", "target" => target.to_string(), "result" => result)
        .increment(1);
    metrics::histogram!("monitor_probe_duration_seconds", "target" => target.to_string())
        .record(latency.as_secs_f64());
}

/// Record the current classified status of a target.
pub fn record_target_up(target: &str, up: bool) {
    metrics::gauge!("monitor_target_up", "target" => target.to_string())
        .set(if up { 1.0 } else { 0.0 });
}

/// Record a status transition.
pub fn record_transition(target: &str, to: &'static str) {
    metrics::counter!("monitor_transitions_total", "target" => target.to_string(), "to" => to)
        .increment(1);
}

/// Record a remediation outcome (`ok`, `error`, `panic`, `dropped`).
pub fn record_remediation(target: &str, result: &'static str) {
    metrics::counter!("monitor_remediations_total", "target" => target.to_string(), "result" => result)
        .increment(1);
}
