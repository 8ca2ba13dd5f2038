//! Metrics collection and exposition.
//!
//! # Metrics
//! - `sidecar_probes_total` (counter): supervision probes answered
//! - `sidecar_notifications_total` (counter): change notifications received
//! - `sidecar_descriptor_fetch_total` (counter): fetches by outcome
//! - `sidecar_reconfigurations_total` (counter): completed kill/start cycles
//! - `sidecar_agent_starts_total` (counter): agent generations launched
//! - `sidecar_agent_running` (gauge): 1 while a generation is alive
//! - `sidecar_subscription_attempts_total` (counter): attempts by outcome
//!
//! Recording is a no-op until `init_metrics` installs the exporter.

use std::net::SocketAddr;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter with its own HTTP listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_probe() {
    metrics::counter!("sidecar_probes_total").increment(1);
}

pub fn record_notification() {
    metrics::counter!("sidecar_notifications_total").increment(1);
}

pub fn record_descriptor_fetch(success: bool) {
    let outcome = if success { "success" } else { "failure" };
    metrics::counter!("sidecar_descriptor_fetch_total", "outcome" => outcome).increment(1);
}

pub fn record_reconfiguration() {
    metrics::counter!("sidecar_reconfigurations_total").increment(1);
}

pub fn record_agent_start() {
    metrics::counter!("sidecar_agent_starts_total").increment(1);
    metrics::gauge!("sidecar_agent_running").set(1.0);
}

pub fn record_agent_exit() {
    metrics::gauge!("sidecar_agent_running").set(0.0);
}

pub fn record_subscription_attempt(outcome: &'static str) {
    metrics::counter!("sidecar_subscription_attempts_total", "outcome" => outcome).increment(1);
}
