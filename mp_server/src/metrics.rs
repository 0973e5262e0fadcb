//! Prometheus metrics for the pairing server.
//!
//! Counters are recorded through the `metrics` facade and exported in
//! Prometheus text format when an exporter is installed. Without one the
//! calls are no-ops.
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use mp_server::metrics;
//! use std::net::SocketAddr;
//!
//! let addr: SocketAddr = "127.0.0.1:9090".parse().unwrap();
//! metrics::init_metrics(addr).unwrap();
//!
//! metrics::pairings_generated_total("single_elimination", "auto");
//! metrics::pairing_transitions_total("approve", "ok");
//! ```

use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;

/// Initialize Prometheus metrics exporter.
///
/// Metrics will be available at `http://<addr>/metrics`.
pub fn init_metrics(addr: SocketAddr) -> Result<(), String> {
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| format!("Failed to install Prometheus exporter: {}", e))
}

// ============================================================================
// HTTP Metrics
// ============================================================================

/// Record HTTP request.
pub fn http_requests_total(method: &str, path: &str, status: u16) {
    metrics::counter!("http_requests_total",
        "method" => method.to_string(),
        "path" => path.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

/// Record HTTP request duration in milliseconds.
pub fn http_request_duration_ms(method: &str, path: &str, duration_ms: f64) {
    metrics::histogram!("http_request_duration_ms",
        "method" => method.to_string(),
        "path" => path.to_string()
    )
    .record(duration_ms);
}

// ============================================================================
// Pairing Metrics
// ============================================================================

/// Increment generated pairings counter.
pub fn pairings_generated_total(format: &str, pairing_type: &str) {
    metrics::counter!("pairings_generated_total",
        "format" => format.to_string(),
        "type" => pairing_type.to_string()
    )
    .increment(1);
}

/// Increment workflow transitions counter.
///
/// `outcome` is `ok` or the error class that stopped the transition.
pub fn pairing_transitions_total(transition: &str, outcome: &str) {
    metrics::counter!("pairing_transitions_total",
        "transition" => transition.to_string(),
        "outcome" => outcome.to_string()
    )
    .increment(1);
}

/// Record pair count of a generated or edited pairing.
pub fn pairing_pairs(count: usize) {
    metrics::histogram!("pairing_pairs").record(count as f64);
}
