//! Metrics for token requests.
//!
//! All metrics follow Prometheus naming conventions:
//! - `token_client_` prefix
//! - `_total` suffix for counters
//! - `_seconds` suffix for duration histograms
//!
//! The crate only records through the `metrics` facade; installing a
//! recorder/exporter is the embedding application's job.

use metrics::{counter, histogram};
use std::time::Duration;

/// Outcome label for a token request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestOutcome {
    /// 2xx response carrying an access token.
    Success,
    /// 2xx response without an access token.
    MissingToken,
    /// Non-2xx response.
    HttpError,
    /// Connection error or timeout.
    TransportError,
    /// 2xx response whose body did not parse.
    InvalidResponse,
}

impl RequestOutcome {
    /// Bounded label value.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            RequestOutcome::Success => "success",
            RequestOutcome::MissingToken => "missing_token",
            RequestOutcome::HttpError => "http_error",
            RequestOutcome::TransportError => "transport_error",
            RequestOutcome::InvalidResponse => "invalid_response",
        }
    }
}

/// Record a completed token request.
///
/// Metric: `token_client_requests_total`, `token_client_request_duration_seconds`
/// Labels: `outcome`
pub fn record_token_request(outcome: RequestOutcome, duration: Duration) {
    histogram!("token_client_request_duration_seconds",
        "outcome" => outcome.as_str()
    )
    .record(duration.as_secs_f64());

    counter!("token_client_requests_total",
        "outcome" => outcome.as_str()
    )
    .increment(1);
}
