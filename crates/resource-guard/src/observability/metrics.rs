//! Metrics definitions for the resource guard.
//!
//! All metrics follow Prometheus naming conventions:
//! - `resource_guard_` prefix
//! - `_total` suffix for counters
//! - `_seconds` suffix for duration histograms
//!
//! # Cardinality
//!
//! Labels are bounded:
//! - `outcome`: `success` plus one value per `ValidationError` kind
//! - `status`: `success` or `error`
//! - `method`: HTTP methods
//! - `endpoint`: known routes, everything else is `/other`
//! - `status_code`: HTTP status codes

use metrics::{counter, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::time::Duration;

/// Initialize Prometheus metrics recorder and return the handle
/// for serving metrics via HTTP.
///
/// Must be called before any metrics are recorded.
///
/// # Errors
///
/// Returns error if Prometheus recorder fails to install (e.g., already installed).
pub fn init_metrics_recorder() -> Result<PrometheusHandle, String> {
    PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Prefix("resource_guard_http_request".to_string()),
            &[
                0.005, 0.010, 0.025, 0.050, 0.100, 0.150, 0.200, 0.300, 0.500, 1.000, 2.000,
            ],
        )
        .map_err(|e| format!("Failed to set HTTP request buckets: {e}"))?
        // Validation includes the JWKS fetch when the cache is cold
        .set_buckets_for_metric(
            Matcher::Prefix("resource_guard_token_validation".to_string()),
            &[
                0.0005, 0.001, 0.002, 0.005, 0.010, 0.050, 0.100, 0.250, 0.500, 1.000,
            ],
        )
        .map_err(|e| format!("Failed to set token validation buckets: {e}"))?
        .set_buckets_for_metric(
            Matcher::Prefix("resource_guard_jwks_fetch".to_string()),
            &[0.010, 0.050, 0.100, 0.250, 0.500, 1.000, 2.500, 5.000, 10.000],
        )
        .map_err(|e| format!("Failed to set JWKS fetch buckets: {e}"))?
        .install_recorder()
        .map_err(|e| format!("Failed to install Prometheus recorder: {e}"))
}

// ============================================================================
// Token Validation Metrics
// ============================================================================

/// Record a token validation outcome.
///
/// Metric: `resource_guard_token_validations_total`,
/// `resource_guard_token_validation_duration_seconds`
/// Labels: `outcome`
pub fn record_validation(outcome: &'static str, duration: Duration) {
    histogram!("resource_guard_token_validation_duration_seconds",
        "outcome" => outcome
    )
    .record(duration.as_secs_f64());

    counter!("resource_guard_token_validations_total",
        "outcome" => outcome
    )
    .increment(1);
}

/// Record a JWKS fetch.
///
/// Metric: `resource_guard_jwks_fetches_total`, `resource_guard_jwks_fetch_duration_seconds`
/// Labels: `status`
pub fn record_jwks_fetch(success: bool, duration: Duration) {
    let status = if success { "success" } else { "error" };

    histogram!("resource_guard_jwks_fetch_duration_seconds",
        "status" => status
    )
    .record(duration.as_secs_f64());

    counter!("resource_guard_jwks_fetches_total",
        "status" => status
    )
    .increment(1);
}

// ============================================================================
// HTTP Request Metrics
// ============================================================================

/// Record HTTP request completion
///
/// Metric: `resource_guard_http_requests_total`,
/// `resource_guard_http_request_duration_seconds`
/// Labels: `method`, `endpoint`, `status_code`
pub fn record_http_request(method: &str, endpoint: &str, status_code: u16, duration: Duration) {
    let normalized_endpoint = normalize_endpoint(endpoint);

    histogram!("resource_guard_http_request_duration_seconds",
        "method" => method.to_string(),
        "endpoint" => normalized_endpoint
    )
    .record(duration.as_secs_f64());

    counter!("resource_guard_http_requests_total",
        "method" => method.to_string(),
        "endpoint" => normalized_endpoint,
        "status_code" => status_code.to_string()
    )
    .increment(1);
}

/// Normalize endpoint path to prevent label cardinality explosion
fn normalize_endpoint(path: &str) -> &'static str {
    match path {
        "/health" => "/health",
        "/metrics" => "/metrics",
        "/api/v1/protected" => "/api/v1/protected",
        _ => "/other",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_endpoint() {
        assert_eq!(normalize_endpoint("/health"), "/health");
        assert_eq!(normalize_endpoint("/api/v1/protected"), "/api/v1/protected");
        assert_eq!(normalize_endpoint("/api/v1/protected/123"), "/other");
        assert_eq!(normalize_endpoint("/wp-admin"), "/other");
    }

    #[test]
    fn test_record_without_recorder_is_noop() {
        record_validation("success", Duration::from_millis(1));
        record_jwks_fetch(false, Duration::from_millis(5));
        record_http_request("GET", "/health", 200, Duration::from_millis(2));
    }
}
