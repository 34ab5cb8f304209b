//! HTTP middleware.

pub mod auth;
pub mod http_metrics;

pub use auth::{require_bearer, ClaimsExt};
pub use http_metrics::http_metrics_middleware;
