//! Observability for the resource guard.

pub mod metrics;
