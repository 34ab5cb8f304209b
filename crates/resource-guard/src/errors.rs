//! Resource guard error types.
//!
//! Construction errors (`ConfigurationInvalid`) surface synchronously and are
//! fatal to the component being built. Validation errors (`ValidationError`)
//! stay distinguishable for logging and metrics, but every variant means
//! "reject this request" to the caller. None of them carry low-level decode
//! details; those are logged at debug level where they occur.

use thiserror::Error;

/// A validator setting failed validation at construction time.
///
/// Fix the configuration and construct again; no partially valid value is
/// ever returned alongside this error.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("Configuration error: {0}")]
pub struct ConfigurationInvalid(pub String);

/// Why a bearer token was rejected.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    /// Empty, oversized, structurally invalid, or undecodable token.
    #[error("The access token is malformed")]
    MalformedToken,

    /// No usable signing key for the token's `kid`.
    #[error("No signing key found for the access token")]
    KeyNotFound,

    /// Token `alg` is unknown or not permitted for the resolved key.
    #[error("The access token algorithm is not permitted")]
    AlgorithmMismatch,

    /// Signature did not verify.
    #[error("The access token signature is invalid")]
    SignatureInvalid,

    /// `exp` is in the past (beyond leeway).
    #[error("The access token has expired")]
    TokenExpired,

    /// `nbf` is in the future (beyond leeway).
    #[error("The access token is not yet valid")]
    TokenNotYetValid,

    /// `aud` is missing or does not contain the expected audience.
    #[error("The access token audience is invalid")]
    AudienceMismatch,

    /// Signing keys could not be fetched.
    #[error("Signing keys are unavailable")]
    KeyFetchFailed,
}

impl ValidationError {
    /// Bounded label value for metrics and logs.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ValidationError::MalformedToken => "malformed_token",
            ValidationError::KeyNotFound => "key_not_found",
            ValidationError::AlgorithmMismatch => "algorithm_mismatch",
            ValidationError::SignatureInvalid => "signature_invalid",
            ValidationError::TokenExpired => "token_expired",
            ValidationError::TokenNotYetValid => "token_not_yet_valid",
            ValidationError::AudienceMismatch => "audience_mismatch",
            ValidationError::KeyFetchFailed => "key_fetch_failed",
        }
    }
}
