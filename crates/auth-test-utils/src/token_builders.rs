//! Builder for test token claims

use chrono::{Duration, Utc};
use serde_json::{json, Map, Value};

/// Default audience for test tokens.
pub const TEST_AUDIENCE: &str = "orders-api";

/// Builder for creating test JWT claims
///
/// # Example
/// ```rust,ignore
/// let claims = TestTokenBuilder::new()
///     .for_subject("svc-billing")
///     .with_scope("orders:read")
///     .expires_in(3600)
///     .build();
/// let token = key.sign(&claims);
/// ```
pub struct TestTokenBuilder {
    sub: String,
    aud: Option<Value>,
    exp: Option<i64>,
    iat: i64,
    nbf: Option<i64>,
    iss: Option<String>,
    scope: Option<String>,
}

impl TestTokenBuilder {
    /// Create a new builder: audience `orders-api`, expiring in one hour.
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            sub: "test-subject".to_string(),
            aud: Some(json!(TEST_AUDIENCE)),
            exp: Some((now + Duration::seconds(3600)).timestamp()),
            iat: now.timestamp(),
            nbf: None,
            iss: None,
            scope: None,
        }
    }

    /// Set the subject
    pub fn for_subject(mut self, subject: &str) -> Self {
        self.sub = subject.to_string();
        self
    }

    /// Set a single audience
    pub fn for_audience(mut self, audience: &str) -> Self {
        self.aud = Some(json!(audience));
        self
    }

    /// Set several audiences (`aud` as an array)
    pub fn for_audiences(mut self, audiences: &[&str]) -> Self {
        self.aud = Some(json!(audiences));
        self
    }

    /// Omit `aud`
    pub fn without_audience(mut self) -> Self {
        self.aud = None;
        self
    }

    /// Set the scope (space-separated)
    pub fn with_scope(mut self, scope: &str) -> Self {
        self.scope = Some(scope.to_string());
        self
    }

    /// Set the issuer
    pub fn issued_by(mut self, issuer: &str) -> Self {
        self.iss = Some(issuer.to_string());
        self
    }

    /// Set expiration in seconds from now (negative for the past)
    pub fn expires_in(mut self, seconds: i64) -> Self {
        self.exp = Some((Utc::now() + Duration::seconds(seconds)).timestamp());
        self
    }

    /// Set `nbf` in seconds from now (positive for the future)
    pub fn not_before(mut self, seconds: i64) -> Self {
        self.nbf = Some((Utc::now() + Duration::seconds(seconds)).timestamp());
        self
    }

    /// Omit `exp`
    pub fn without_expiry(mut self) -> Self {
        self.exp = None;
        self
    }

    /// Build the claims as a JSON value
    pub fn build(self) -> Value {
        let mut claims = Map::new();
        claims.insert("sub".to_string(), json!(self.sub));
        claims.insert("iat".to_string(), json!(self.iat));
        if let Some(aud) = self.aud {
            claims.insert("aud".to_string(), aud);
        }
        if let Some(exp) = self.exp {
            claims.insert("exp".to_string(), json!(exp));
        }
        if let Some(nbf) = self.nbf {
            claims.insert("nbf".to_string(), json!(nbf));
        }
        if let Some(iss) = self.iss {
            claims.insert("iss".to_string(), json!(iss));
        }
        if let Some(scope) = self.scope {
            claims.insert("scope".to_string(), json!(scope));
        }
        Value::Object(claims)
    }
}

impl Default for TestTokenBuilder {
    fn default() -> Self {
        Self::new()
    }
}
