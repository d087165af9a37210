//! Metrics collection and exposition.
//!
//! # Metrics
//! - `relay_sessions_total` (counter): finished sessions by outcome
//! - `relay_session_duration_seconds` (histogram): session lifetimes
//! - `relay_active_sessions` (gauge): currently open sessions
//! - `relay_bytes_total` (counter): audio bytes forwarded to callers
//! - `relay_upstream_errors_total` (counter): upstream failures by kind
//! - `relay_rejected_sessions_total` (counter): callers turned away by the session limit
//!
//! Without an installed recorder every call is a no-op.

use std::net::SocketAddr;
use std::time::Duration;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus recorder with its own HTTP listener.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

pub fn set_active_sessions(active: usize) {
    gauge!("relay_active_sessions").set(active as f64);
}

pub fn record_session_end(outcome: &'static str, duration: Duration) {
    counter!("relay_sessions_total", "outcome" => outcome).increment(1);
    histogram!("relay_session_duration_seconds").record(duration.as_secs_f64());
}

pub fn record_bytes(len: usize) {
    counter!("relay_bytes_total").increment(len as u64);
}

pub fn record_upstream_error(kind: &'static str) {
    counter!("relay_upstream_errors_total", "kind" => kind).increment(1);
}

pub fn record_rejected_session() {
    counter!("relay_rejected_sessions_total").increment(1);
}
