//! Bearer token authentication.
//!
//! - `claims` - Validated token claims
//! - `jwks` - Signing key resolution (fetching, caching, pinned)
//! - `algorithms` - Algorithm binding to JWK metadata
//! - `jwt` - Validator configuration and token validation

pub mod algorithms;
pub mod claims;
pub mod jwks;
pub mod jwt;

pub use crate::errors::ValidationError;
pub use claims::{Audience, Claims};
pub use jwks::{
    CachingJwksClient, Jwk, JwksClient, JwksDocument, KeyResolutionError, KeyResolver,
    StaticKeyResolver,
};
pub use jwt::{TokenValidator, ValidatorConfig};
