//! Bearer token gate.
//!
//! Framework-agnostic core of request authentication: given the raw
//! `Authorization` header value (if any), accept with the validated claims
//! or reject with a short reason. The axum middleware in
//! `middleware::auth` is a thin adapter over [`AuthGate::authorize`].
//!
//! Every validator failure is a rejection; there is no path on which an
//! error lets the request through.

use crate::auth::{Claims, TokenValidator, ValidationError};
use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;

/// Why a request was turned away. Every variant is a 401.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    #[error("Authorization header missing")]
    MissingHeader,

    #[error("Invalid token type")]
    InvalidTokenType,

    #[error("Token has expired")]
    TokenExpired,

    #[error("Invalid audience")]
    InvalidAudience,

    #[error("Token is invalid")]
    InvalidToken,
}

impl Rejection {
    /// Machine-readable reason returned in the response body.
    #[must_use]
    pub fn reason(self) -> &'static str {
        match self {
            Rejection::MissingHeader => "Authorization header missing",
            Rejection::InvalidTokenType => "Invalid token type",
            Rejection::TokenExpired => "Token has expired",
            Rejection::InvalidAudience => "Invalid audience",
            Rejection::InvalidToken => "Token is invalid",
        }
    }
}

impl From<ValidationError> for Rejection {
    fn from(e: ValidationError) -> Self {
        match e {
            ValidationError::TokenExpired => Rejection::TokenExpired,
            ValidationError::AudienceMismatch => Rejection::InvalidAudience,
            ValidationError::MalformedToken
            | ValidationError::TokenNotYetValid
            | ValidationError::KeyNotFound
            | ValidationError::AlgorithmMismatch
            | ValidationError::SignatureInvalid
            | ValidationError::KeyFetchFailed => Rejection::InvalidToken,
        }
    }
}

#[derive(Serialize)]
struct RejectionBody {
    error: &'static str,
}

impl IntoResponse for Rejection {
    fn into_response(self) -> Response {
        let mut response = (
            StatusCode::UNAUTHORIZED,
            Json(RejectionBody {
                error: self.reason(),
            }),
        )
            .into_response();

        // RFC 6750: no error code when the request carried no credentials
        let challenge = match self {
            Rejection::MissingHeader => "Bearer realm=\"resource-guard\"",
            _ => "Bearer realm=\"resource-guard\", error=\"invalid_token\"",
        };
        response.headers_mut().insert(
            header::WWW_AUTHENTICATE,
            HeaderValue::from_static(challenge),
        );

        response
    }
}

/// Extract the token from an `Authorization` header value.
///
/// The value must split on whitespace into exactly two parts, the first
/// being the literal `Bearer`.
///
/// # Errors
///
/// Returns `Rejection::InvalidTokenType` for any other shape.
pub fn extract_bearer(header_value: &str) -> Result<&str, Rejection> {
    let mut parts = header_value.split_whitespace();
    match (parts.next(), parts.next(), parts.next()) {
        (Some("Bearer"), Some(token), None) => Ok(token),
        _ => Err(Rejection::InvalidTokenType),
    }
}

/// Authorizes requests by their `Authorization` header.
#[derive(Debug, Clone)]
pub struct AuthGate {
    validator: Arc<TokenValidator>,
}

impl AuthGate {
    /// Create a gate backed by `validator`.
    #[must_use]
    pub fn new(validator: Arc<TokenValidator>) -> Self {
        Self { validator }
    }

    /// The validator behind the gate.
    #[must_use]
    pub fn validator(&self) -> &TokenValidator {
        &self.validator
    }

    /// Accept or reject a request given its `Authorization` header value.
    ///
    /// # Errors
    ///
    /// Returns the `Rejection` to send back to the client.
    pub async fn authorize(&self, header_value: Option<&str>) -> Result<Claims, Rejection> {
        let header_value = header_value.ok_or_else(|| {
            tracing::debug!(target: "resource_guard.middleware.auth", "Missing Authorization header");
            Rejection::MissingHeader
        })?;

        let token = extract_bearer(header_value).inspect_err(|_| {
            tracing::debug!(target: "resource_guard.middleware.auth", "Invalid Authorization header format");
        })?;

        self.validator.validate(token).await.map_err(Rejection::from)
    }
}
