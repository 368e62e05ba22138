//! Prometheus metrics exposition
//!
//! - `confluence_proxy_requests_total` (counter): labels `status`, `method`
//! - `confluence_proxy_request_duration_seconds` (histogram): label `status`
//! - `confluence_proxy_upstream_errors_total` (counter): label `error_type`
//! - `confluence_proxy_logins_total` (counter): label `outcome`

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle, PrometheusRecorder};

const DURATION_METRIC: &str = "confluence_proxy_request_duration_seconds";

/// Bucket boundaries from 5ms to 60s, covering the longest upstream timeout
/// an operator is likely to configure.
const DURATION_BUCKETS: &[f64] = &[
    0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0,
];

fn builder() -> PrometheusBuilder {
    PrometheusBuilder::new()
        .set_buckets_for_metric(
            metrics_exporter_prometheus::Matcher::Full(DURATION_METRIC.to_string()),
            DURATION_BUCKETS,
        )
        .expect("failed to set histogram buckets")
}

/// Install the global Prometheus recorder and return a handle for `/metrics`.
pub fn install_recorder() -> PrometheusHandle {
    builder()
        .install_recorder()
        .expect("failed to install Prometheus recorder")
}

/// Recorder that is not installed globally, for tests and embedding.
pub fn build_recorder() -> PrometheusRecorder {
    builder().build_recorder()
}

/// Record a completed request with status code and HTTP method labels.
pub fn record_request(status: u16, method: &str, duration_secs: f64) {
    let status_str = status.to_string();
    metrics::counter!("confluence_proxy_requests_total", "status" => status_str.clone(), "method" => method.to_string())
        .increment(1);
    metrics::histogram!(DURATION_METRIC, "status" => status_str).record(duration_secs);
}

/// Record a failed Confluence call by classification.
pub fn record_upstream_error(error_type: &str) {
    metrics::counter!("confluence_proxy_upstream_errors_total", "error_type" => error_type.to_string())
        .increment(1);
}

/// Record how an `/auth/callback` ended.
pub fn record_login(outcome: &'static str) {
    metrics::counter!("confluence_proxy_logins_total", "outcome" => outcome).increment(1);
}
