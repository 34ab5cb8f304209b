//! Liveness probe.

/// Health check handler. Always `OK` while the process serves requests.
pub async fn health_check() -> &'static str {
    "OK"
}
