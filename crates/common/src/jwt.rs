//! JWT utilities shared by the resource guard and its test tooling.
//!
//! This module provides:
//! - Size limits for DoS prevention
//! - Leeway constants for `exp` validation
//! - Unverified header inspection (`alg` and `kid`) for key selection
//!
//! # Security
//!
//! - Tokens are size-checked BEFORE parsing (DoS prevention)
//! - Nothing read here is trusted: the header only selects which key, fetched
//!   from a pinned JWKS endpoint, is used to verify the whole token
//! - Error messages are generic; details are logged at debug level

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use std::time::Duration;
use thiserror::Error;

// =============================================================================
// Constants
// =============================================================================

/// Maximum allowed JWT size in bytes (8KB).
///
/// Typical access tokens are well under 2KB; anything larger is rejected
/// before base64 decoding or signature verification allocates for it.
pub const MAX_JWT_SIZE_BYTES: usize = 8192;

/// Default leeway applied to `exp`/`nbf` checks. A token is expired the
/// second its `exp` passes unless a leeway is configured.
pub const DEFAULT_LEEWAY: Duration = Duration::ZERO;

/// Maximum configurable leeway (10 minutes).
pub const MAX_LEEWAY: Duration = Duration::from_secs(600);

// =============================================================================
// Error Types
// =============================================================================

/// Errors raised while inspecting a token before verification.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum JwtValidationError {
    /// Token size exceeds maximum allowed.
    #[error("The access token is invalid")]
    TokenTooLarge,

    /// Token is not a three-segment compact serialization with a JSON header.
    #[error("The access token is invalid")]
    MalformedToken,

    /// Token header has no usable `kid`.
    #[error("The access token is invalid")]
    MissingKid,
}

// =============================================================================
// Header Inspection
// =============================================================================

/// Header fields read from a token before its signature is checked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnverifiedHeader {
    /// Declared signing algorithm (untrusted).
    pub alg: String,

    /// Key identifier used to select a key from the JWKS.
    pub kid: String,

    /// Declared token type, if any.
    pub typ: Option<String>,
}

/// Read the `alg` and `kid` from a JWT header without verifying the signature.
///
/// # Security
///
/// - Token size is checked BEFORE any parsing
/// - All three segments must be present, non-empty and valid base64url
/// - The returned values are only good for key lookup; the token MUST still
///   be verified against the resolved key
///
/// # Errors
///
/// - `TokenTooLarge` - Token exceeds `MAX_JWT_SIZE_BYTES`
/// - `MalformedToken` - Wrong structure, bad base64, header not a JSON
///   object, or missing `alg`
/// - `MissingKid` - Header has no `kid`, or `kid` is not a non-empty string
pub fn peek_header(token: &str) -> Result<UnverifiedHeader, JwtValidationError> {
    if token.len() > MAX_JWT_SIZE_BYTES {
        tracing::debug!(
            target: "common.jwt",
            token_size = token.len(),
            max_size = MAX_JWT_SIZE_BYTES,
            "Token rejected: size exceeds maximum allowed"
        );
        return Err(JwtValidationError::TokenTooLarge);
    }

    // JWT format: header.payload.signature
    let parts: Vec<&str> = token.split('.').collect();
    let [header_part, payload_part, signature_part] = parts.as_slice() else {
        tracing::debug!(
            target: "common.jwt",
            parts = parts.len(),
            "Token rejected: invalid JWT format"
        );
        return Err(JwtValidationError::MalformedToken);
    };

    for segment in [payload_part, signature_part] {
        if segment.is_empty() || URL_SAFE_NO_PAD.decode(segment).is_err() {
            tracing::debug!(target: "common.jwt", "Token rejected: segment is not base64url");
            return Err(JwtValidationError::MalformedToken);
        }
    }

    let header_bytes = URL_SAFE_NO_PAD.decode(header_part).map_err(|e| {
        tracing::debug!(target: "common.jwt", error = %e, "Failed to decode JWT header base64");
        JwtValidationError::MalformedToken
    })?;

    let header: serde_json::Value = serde_json::from_slice(&header_bytes).map_err(|e| {
        tracing::debug!(target: "common.jwt", error = %e, "Failed to parse JWT header JSON");
        JwtValidationError::MalformedToken
    })?;

    let alg = header
        .get("alg")
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
        .ok_or_else(|| {
            tracing::debug!(target: "common.jwt", "Token rejected: header has no alg");
            JwtValidationError::MalformedToken
        })?;

    // Empty kid is rejected rather than matched against unnamed keys
    let kid = header
        .get("kid")
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
        .ok_or(JwtValidationError::MissingKid)?;

    let typ = header
        .get("typ")
        .and_then(|v| v.as_str())
        .map(ToString::to_string);

    Ok(UnverifiedHeader { alg, kid, typ })
}

// =============================================================================
// Tests
// =============================================================================
