//! Metrics definitions for the booking service.
//!
//! All metrics follow Prometheus naming conventions:
//! - `booking_` prefix
//! - `_total` suffix for counters
//! - `_seconds` suffix for duration histograms
//!
//! # Cardinality
//!
//! Labels are bounded:
//! - `method`: HTTP verbs
//! - `endpoint`: the fixed route set, everything else is `/other`
//! - `outcome`: one value per admission result
//! - `operation`: bounded by code (get_class_for_update, insert_booking, ...)

use metrics::{counter, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::time::Duration;

const HTTP_BUCKETS: &[f64] = &[
    0.005, 0.010, 0.025, 0.050, 0.100, 0.200, 0.300, 0.500, 1.000, 2.000,
];
const ADMISSION_BUCKETS: &[f64] = &[
    0.001, 0.005, 0.010, 0.020, 0.050, 0.100, 0.250, 0.500, 1.000,
];
const DB_BUCKETS: &[f64] = &[
    0.001, 0.002, 0.005, 0.010, 0.020, 0.050, 0.100, 0.250, 0.500, 1.000,
];

fn configured_builder() -> Result<PrometheusBuilder, String> {
    PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Prefix("booking_http_request".to_string()),
            HTTP_BUCKETS,
        )
        .map_err(|e| format!("Failed to set HTTP request buckets: {e}"))?
        .set_buckets_for_metric(
            Matcher::Prefix("booking_admission".to_string()),
            ADMISSION_BUCKETS,
        )
        .map_err(|e| format!("Failed to set admission buckets: {e}"))?
        .set_buckets_for_metric(
            Matcher::Prefix("booking_db_query".to_string()),
            DB_BUCKETS,
        )
        .map_err(|e| format!("Failed to set DB query buckets: {e}"))
}

/// Install the global Prometheus recorder and return the handle used by
/// `GET /metrics`.
///
/// # Errors
///
/// Returns error if the recorder cannot be installed (e.g., already installed).
pub fn init_metrics_recorder() -> Result<PrometheusHandle, String> {
    configured_builder()?
        .install_recorder()
        .map_err(|e| format!("Failed to install Prometheus recorder: {e}"))
}

/// Build a handle that is not installed globally.
///
/// Used by test servers, which may run many times in one process.
pub fn detached_metrics_handle() -> PrometheusHandle {
    PrometheusBuilder::new().build_recorder().handle()
}

// ============================================================================
// HTTP Request Metrics
// ============================================================================

/// Record HTTP request completion.
///
/// Metric: `booking_http_requests_total`, `booking_http_request_duration_seconds`
/// Labels: `method`, `endpoint`, `status`
pub fn record_http_request(method: &str, endpoint: &str, status_code: u16, duration: Duration) {
    let normalized_endpoint = normalize_endpoint(endpoint);
    let status = categorize_status_code(status_code);

    histogram!("booking_http_request_duration_seconds",
        "method" => method.to_string(),
        "endpoint" => normalized_endpoint,
        "status" => status
    )
    .record(duration.as_secs_f64());

    counter!("booking_http_requests_total",
        "method" => method.to_string(),
        "endpoint" => normalized_endpoint,
        "status_code" => status_code.to_string()
    )
    .increment(1);
}

fn categorize_status_code(status_code: u16) -> &'static str {
    match status_code {
        200..=299 => "success",
        408 | 504 => "timeout",
        _ => "error",
    }
}

fn normalize_endpoint(path: &str) -> &'static str {
    match path {
        "/" => "/",
        "/health" => "/health",
        "/metrics" => "/metrics",
        "/book" => "/book",
        "/classes" => "/classes",
        "/bookings" => "/bookings",
        "/users" => "/users",
        _ => "/other",
    }
}

// ============================================================================
// Admission Metrics
// ============================================================================

/// Record one admission attempt.
///
/// Metric: `booking_admissions_total`, `booking_admission_duration_seconds`
/// Labels: `outcome` (`admitted` or an error outcome)
pub fn record_admission(outcome: &'static str, duration: Duration) {
    histogram!("booking_admission_duration_seconds",
        "outcome" => outcome
    )
    .record(duration.as_secs_f64());

    counter!("booking_admissions_total",
        "outcome" => outcome
    )
    .increment(1);
}

/// Record a confirmation dispatch.
///
/// Metric: `booking_notifications_total`
/// Labels: `status` (`sent` or `failed`)
pub fn record_notification(status: &'static str) {
    counter!("booking_notifications_total",
        "status" => status
    )
    .increment(1);
}

// ============================================================================
// Database Metrics
// ============================================================================

/// Record database query execution.
///
/// Metric: `booking_db_query_duration_seconds`, `booking_db_queries_total`
/// Labels: `operation`, `status`
pub fn record_db_query(operation: &'static str, status: &'static str, duration: Duration) {
    histogram!("booking_db_query_duration_seconds",
        "operation" => operation
    )
    .record(duration.as_secs_f64());

    counter!("booking_db_queries_total",
        "operation" => operation,
        "status" => status
    )
    .increment(1);
}

// ============================================================================
// Error Metrics
// ============================================================================

/// Record an error returned to a client.
///
/// Metric: `booking_errors_total`
/// Labels: `error_type`, `status_code`
pub fn record_error(error_type: &'static str, status_code: u16) {
    counter!("booking_errors_total",
        "error_type" => error_type,
        "status_code" => status_code.to_string()
    )
    .increment(1);
}
