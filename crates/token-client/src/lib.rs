//! OAuth 2.0 client-credentials token client.
//!
//! Obtains a bearer token from an authorization server on behalf of a
//! service (no end user involved).
//!
//! # Modules
//!
//! - `credentials` - Validated, immutable client credentials
//! - `requester` - The client-credentials grant request
//! - `errors` - Error types
//! - `config` - Environment configuration for the `fetch-token` binary
//! - `observability` - Metric recording helpers
//!
//! # Example
//!
//! ```rust,ignore
//! use token_client::{ClientCredentials, TokenRequester};
//! use common::secret::{ExposeSecret, SecretString};
//!
//! let credentials = ClientCredentials::new(
//!     "3f2a7c1e-9b4d-4e8a-a1c6-5d0f2b7e9c31",
//!     SecretString::from("secret"),
//!     vec!["orders:read".to_string()],
//!     "https://auth.example.com/oauth2/token",
//! )?;
//!
//! let requester = TokenRequester::new(credentials)?;
//! if let Some(token) = requester.obtain_token().await? {
//!     let header = format!("Bearer {}", token.secret().expose_secret());
//! }
//! ```

pub mod config;
pub mod credentials;
pub mod errors;
pub mod observability;
pub mod requester;

pub use credentials::ClientCredentials;
pub use errors::TokenError;
pub use requester::{AccessToken, TokenRequester};
