//! JWT claims structure.
//!
//! Contains the claims extracted from validated JWTs. The `sub` field is
//! redacted in Debug output to prevent exposure in logs.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The `aud` claim: a single audience or a list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Audience {
    Single(String),
    Multiple(Vec<String>),
}

impl Audience {
    /// Returns `true` if `audience` is one of the token's audiences.
    #[must_use]
    pub fn contains(&self, audience: &str) -> bool {
        match self {
            Audience::Single(aud) => aud == audience,
            Audience::Multiple(auds) => auds.iter().any(|a| a == audience),
        }
    }
}

/// JWT Claims structure for validated tokens.
///
/// The `sub` field contains client identifiers which should not be exposed
/// in logs. A custom Debug implementation redacts this field.
#[derive(Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (client or user id) - redacted in Debug output.
    #[serde(default)]
    pub sub: String,

    /// Intended audience(s). Required by validation; optional here so a
    /// missing `aud` is reported as an audience failure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aud: Option<Audience>,

    /// Expiration timestamp (Unix epoch seconds).
    pub exp: i64,

    /// Issued-at timestamp (Unix epoch seconds).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,

    /// Issuer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,

    /// Space-separated scopes granted to this token.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
}

impl fmt::Debug for Claims {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Claims")
            .field("sub", &"[REDACTED]")
            .field("aud", &self.aud)
            .field("exp", &self.exp)
            .field("iat", &self.iat)
            .field("iss", &self.iss)
            .field("scope", &self.scope)
            .finish()
    }
}

impl Claims {
    /// Check if the token has a specific scope.
    ///
    /// Scopes are space-separated in the JWT claims.
    #[must_use]
    pub fn has_scope(&self, scope: &str) -> bool {
        self.scopes().contains(&scope)
    }

    /// Get all scopes as a vector.
    #[must_use]
    pub fn scopes(&self) -> Vec<&str> {
        self.scope
            .as_deref()
            .map(|s| s.split_whitespace().collect())
            .unwrap_or_default()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn claims_with_scope(scope: Option<&str>) -> Claims {
        Claims {
            sub: "secret-client-id".to_string(),
            aud: Some(Audience::Single("orders-api".to_string())),
            exp: 1_234_567_890,
            iat: Some(1_234_567_800),
            iss: None,
            scope: scope.map(ToString::to_string),
        }
    }

    #[test]
    fn test_claims_debug_redacts_sub() {
        let debug_str = format!("{:?}", claims_with_scope(Some("read")));

        assert!(!debug_str.contains("secret-client-id"));
        assert!(debug_str.contains("[REDACTED]"));
    }

    #[test]
    fn test_claims_has_scope() {
        let claims = claims_with_scope(Some("read write admin"));

        assert!(claims.has_scope("read"));
        assert!(claims.has_scope("admin"));
        assert!(!claims.has_scope("delete"));
        assert!(!claims.has_scope("rea")); // Partial match should not work
    }

    #[test]
    fn test_claims_without_scope() {
        let claims = claims_with_scope(None);
        assert!(claims.scopes().is_empty());
        assert!(!claims.has_scope("read"));
    }

    #[test]
    fn test_audience_string_or_array() {
        let single: Claims =
            serde_json::from_str(r#"{"sub":"a","aud":"orders-api","exp":1}"#).unwrap();
        let multiple: Claims =
            serde_json::from_str(r#"{"sub":"a","aud":["billing","orders-api"],"exp":1}"#)
                .unwrap();

        assert!(single.aud.unwrap().contains("orders-api"));
        let multiple = multiple.aud.unwrap();
        assert!(multiple.contains("orders-api"));
        assert!(!multiple.contains("inventory"));
    }

    #[test]
    fn test_missing_aud_deserializes() {
        let claims: Claims = serde_json::from_str(r#"{"sub":"a","exp":1}"#).unwrap();
        assert!(claims.aud.is_none());
    }
}
