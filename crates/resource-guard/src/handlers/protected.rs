//! Sample protected resource.

use crate::auth::Claims;
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};
use tracing::instrument;

/// Body returned by the protected endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtectedResponse {
    /// Token subject.
    pub subject: String,

    /// Scopes granted to the token.
    pub scopes: Vec<String>,
}

/// Echo the caller's identity. Only reachable through `require_bearer`.
#[instrument(skip_all, name = "resource_guard.handlers.protected")]
pub async fn protected_resource(Extension(claims): Extension<Claims>) -> Json<ProtectedResponse> {
    Json(ProtectedResponse {
        scopes: claims.scopes().into_iter().map(ToString::to_string).collect(),
        subject: claims.sub,
    })
}
