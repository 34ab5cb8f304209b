//! Secret types for protecting sensitive values from accidental logging.
//!
//! Re-exports the [`secrecy`] types used for client secrets and access
//! tokens. `SecretString` redacts itself in `Debug`, so any struct deriving
//! `Debug` that holds one is safe to log.
//!
//! # Example
//!
//! ```rust
//! use common::secret::{ExposeSecret, SecretString};
//!
//! #[derive(Debug)]
//! struct TokenRequest {
//!     client_id: String,
//!     client_secret: SecretString,
//! }
//!
//! let req = TokenRequest {
//!     client_id: "3f2a7c1e-9b4d-4e8a-a1c6-5d0f2b7e9c31".to_string(),
//!     client_secret: SecretString::from("s3cr3t"),
//! };
//!
//! assert!(!format!("{req:?}").contains("s3cr3t"));
//! assert_eq!(req.client_secret.expose_secret(), "s3cr3t");
//! ```
//!
//! Use `SecretString` for:
//! - OAuth client secrets
//! - Bearer / access tokens

pub use secrecy::{ExposeSecret, SecretString};
