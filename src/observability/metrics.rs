//! Metrics collection and exposition.
//!
//! # Metrics
//! - `ethscribe_decode_total` (counter): decoded payloads by content kind
//! - `ethscribe_owner_index_pages_total` (counter): owner-index pages fetched
//! - `ethscribe_verify_chunks_total` (counter): verification chunks by outcome
//! - `ethscribe_withdrawal_transitions_total` (counter): withdrawal state transitions
//!
//! # Design Decisions
//! - Recording is a no-op until an exporter is installed
//! - Labels are static strings only

use std::net::SocketAddr;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter on `addr`. Must be called inside a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_decode(kind: &'static str) {
    metrics::counter!("ethscribe_decode_total", "kind" => kind).increment(1);
}

pub fn record_owner_index_page() {
    metrics::counter!("ethscribe_owner_index_pages_total").increment(1);
}

/// `outcome` is `"ok"` or `"failed"`.
pub fn record_verify_chunk(outcome: &'static str) {
    metrics::counter!("ethscribe_verify_chunks_total", "outcome" => outcome).increment(1);
}

pub fn record_withdrawal_transition(state: &'static str) {
    metrics::counter!("ethscribe_withdrawal_transitions_total", "state" => state).increment(1);
}
