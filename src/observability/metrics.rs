//! Metrics collection and exposition.
//!
//! # Metrics
//! - `tails_requests_total` (counter): requests by dispatch class, status
//! - `tails_request_duration_seconds` (histogram): latency by dispatch class
//! - `tails_handler_errors_total` (counter): 500s by error code
//! - `tails_hmr_sessions_active` (gauge): open HMR sockets
//! - `tails_hmr_messages_total` (counter): HMR frames sent by type
//! - `tails_modules_cached` (gauge): records in the module cache

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter with its own HTTP listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint started"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to start metrics endpoint"),
    }
}

pub fn record_request(class: &'static str, status: u16, start: Instant) {
    counter!("tails_requests_total", "class" => class, "status" => status.to_string()).increment(1);
    histogram!("tails_request_duration_seconds", "class" => class)
        .record(start.elapsed().as_secs_f64());
}

pub fn record_handler_error(code: &'static str) {
    counter!("tails_handler_errors_total", "code" => code).increment(1);
}

pub fn record_hmr_session_opened() {
    gauge!("tails_hmr_sessions_active").increment(1.0);
}

pub fn record_hmr_session_closed() {
    gauge!("tails_hmr_sessions_active").decrement(1.0);
}

pub fn record_hmr_message(kind: &'static str) {
    counter!("tails_hmr_messages_total", "type" => kind).increment(1);
}

pub fn record_module_cache_size(size: usize) {
    gauge!("tails_modules_cached").set(size as f64);
}
