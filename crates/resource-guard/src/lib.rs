//! Bearer token guard for resource servers.
//!
//! Verifies `Authorization: Bearer <jwt>` against signing keys published at
//! a JWKS endpoint, enforcing signature, algorithm binding, audience and
//! expiry before a protected handler runs.
//!
//! # Modules
//!
//! - `auth` - Token validation core (claims, key resolution, validator)
//! - `gate` - Framework-agnostic accept/reject decision
//! - `middleware` - axum adapters (bearer gate, HTTP metrics)
//! - `routes`, `handlers` - Demo resource server
//! - `config` - Environment configuration
//! - `observability` - Metrics
//!
//! # Example
//!
//! ```rust,ignore
//! use resource_guard::auth::{TokenValidator, ValidatorConfig};
//! use resource_guard::gate::AuthGate;
//! use resource_guard::middleware::require_bearer;
//! use std::sync::Arc;
//!
//! let config = ValidatorConfig::new("https://auth.example.com/.well-known/jwks.json", "orders-api")?;
//! let gate = Arc::new(AuthGate::new(Arc::new(TokenValidator::new(config)?)));
//!
//! let app = Router::new()
//!     .route("/orders", get(list_orders))
//!     .route_layer(axum::middleware::from_fn_with_state(gate, require_bearer));
//! ```

pub mod auth;
pub mod config;
pub mod errors;
pub mod gate;
pub mod handlers;
pub mod middleware;
pub mod observability;
pub mod routes;
