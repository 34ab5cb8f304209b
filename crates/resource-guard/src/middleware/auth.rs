//! Authentication middleware for protected routes.
//!
//! Runs the [`AuthGate`] on the request's `Authorization` header and injects
//! the validated claims into request extensions. The wrapped handler's
//! response is returned unmodified.

use crate::auth::Claims;
use crate::gate::{AuthGate, Rejection};
use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use tracing::instrument;

/// Bearer token middleware, for use with `axum::middleware::from_fn_with_state`.
///
/// # Authorization Header Format
///
/// ```text
/// Authorization: Bearer <token>
/// ```
///
/// # Response
///
/// - 401 with `{"error": "<reason>"}` and a `WWW-Authenticate` header if the
///   header is missing, malformed, or the token fails validation
/// - Otherwise the next handler's response, untouched
#[instrument(skip_all, name = "resource_guard.middleware.auth")]
pub async fn require_bearer(
    State(gate): State<Arc<AuthGate>>,
    mut req: Request,
    next: Next,
) -> Result<Response, Rejection> {
    let header_value = match req.headers().get(AUTHORIZATION) {
        None => None,
        Some(value) => Some(value.to_str().map_err(|_| {
            tracing::debug!(target: "resource_guard.middleware.auth", "Authorization header is not valid text");
            Rejection::InvalidTokenType
        })?),
    };

    let claims = gate.authorize(header_value).await.inspect_err(|rejection| {
        tracing::debug!(
            target: "resource_guard.middleware.auth",
            reason = rejection.reason(),
            "Request rejected"
        );
    })?;

    req.extensions_mut().insert(claims);

    Ok(next.run(req).await)
}

/// Extension trait for extracting claims from request.
pub trait ClaimsExt {
    /// Get the authenticated claims from request extensions.
    ///
    /// Returns `None` if auth middleware was not applied to this request.
    fn claims(&self) -> Option<&Claims>;
}

impl<B> ClaimsExt for axum::extract::Request<B> {
    fn claims(&self) -> Option<&Claims> {
        self.extensions().get::<Claims>()
    }
}
