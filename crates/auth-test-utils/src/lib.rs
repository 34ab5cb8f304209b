//! Test utilities for the token client and the resource guard
//!
//! Provides:
//! - Signing keys for RSA, ECDSA P-256 and Ed25519 with matching JWKs
//! - A claims builder for test tokens
//! - Mock JWKS and token endpoints (wiremock)
//! - A harness that serves the real resource guard router
//!
//! # Example
//!
//! ```rust,ignore
//! use auth_test_utils::*;
//!
//! let key = TestSigningKey::ed25519(1, "ed-key-01");
//! let jwks = MockJwksServer::start(&[&key]).await;
//! let token = key.sign(&TestTokenBuilder::new().with_scope("orders:read").build());
//! ```

pub mod crypto_fixtures;
pub mod jwks_server;
pub mod server_harness;
pub mod token_builders;
pub mod token_server;

pub use crypto_fixtures::*;
pub use jwks_server::*;
pub use server_harness::*;
pub use token_builders::*;
pub use token_server::*;
