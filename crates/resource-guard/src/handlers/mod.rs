//! HTTP request handlers.

mod health;
mod metrics;
mod protected;

pub use health::health_check;
pub use metrics::metrics_handler;
pub use protected::{protected_resource, ProtectedResponse};
