//! Metrics collection and exposition.
//!
//! # Metrics
//! - `toon_requests_decoded_total` (counter): TOON request bodies decoded
//! - `toon_body_rejections_total` (counter): bodies refused, by `reason`
//!   (`too_large`, `timeout`, `read_error`, `parse_error`)
//! - `toon_responses_encoded_total` (counter): responses sent as TOON
//! - `toon_fallbacks_total` (counter): codec failures absorbed by the error
//!   policy, by `operation`

use std::net::SocketAddr;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus recorder and its scrape listener.
///
/// Must be called from inside a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

pub fn record_decoded() {
    ::metrics::counter!("toon_requests_decoded_total").increment(1);
}

pub fn record_body_rejection(reason: &'static str) {
    ::metrics::counter!("toon_body_rejections_total", "reason" => reason).increment(1);
}

pub fn record_encoded() {
    ::metrics::counter!("toon_responses_encoded_total").increment(1);
}

pub fn record_fallback(operation: &'static str) {
    ::metrics::counter!("toon_fallbacks_total", "operation" => operation).increment(1);
}
