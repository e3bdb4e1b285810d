//! Metrics collection and exposition.
//!
//! # Metrics
//! - `monitor_probes_total` (counter): probe results by outcome
//! - `monitor_connection_state` (gauge): 1=healthy, 0=failed, -1=unknown
//! - `monitor_notifications_total` (counter): by kind and result
//! - `monitor_rate_limited_total` (counter): denied requests by route class
//! - `monitor_auth_failures_total` (counter): rejected credentials by reason
//!
//! Recording is always safe; without an installed exporter the facade
//! discards the values.

use std::net::SocketAddr;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

use crate::health::probe::ProbeOutcome;
use crate::health::state::ConnectionState;
use crate::notify::NotificationKind;

/// Install the Prometheus exporter on its own listener.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

pub fn record_probe(outcome: ProbeOutcome) {
    ::metrics::counter!("monitor_probes_total", "outcome" => outcome.as_str()).increment(1);
}

pub fn record_connection_state(state: ConnectionState) {
    let value = match state {
        ConnectionState::Healthy => 1.0,
        ConnectionState::Failed => 0.0,
        ConnectionState::Unknown => -1.0,
    };
    ::metrics::gauge!("monitor_connection_state").set(value);
}

pub fn record_notification(kind: NotificationKind, delivered: bool) {
    let result = if delivered { "sent" } else { "failed" };
    ::metrics::counter!(
        "monitor_notifications_total",
        "kind" => kind.as_str(),
        "result" => result
    )
    .increment(1);
}

pub fn record_rate_limited(route: &'static str) {
    ::metrics::counter!("monitor_rate_limited_total", "route" => route).increment(1);
}

pub fn record_auth_failure(reason: &'static str) {
    ::metrics::counter!("monitor_auth_failures_total", "reason" => reason).increment(1);
}
