//! Mock JWKS endpoint
//!
//! Wraps a wiremock server that publishes signing keys at
//! `/.well-known/jwks.json`, so validators can be pointed at a real HTTP
//! endpoint.

use crate::crypto_fixtures::TestSigningKey;
use resource_guard::auth::ValidatorConfig;
use serde_json::{json, Value};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Path the mock publishes the key set at.
pub const JWKS_PATH: &str = "/.well-known/jwks.json";

/// Build a JWKS document from signing keys.
pub fn jwks_document(keys: &[&TestSigningKey]) -> Value {
    json!({ "keys": keys.iter().map(|k| k.jwk()).collect::<Vec<_>>() })
}

/// Mock JWKS server.
///
/// # Example
/// ```rust,ignore
/// let key = TestSigningKey::rsa("rsa-1");
/// let jwks = MockJwksServer::start(&[&key]).await;
/// let validator = TokenValidator::new(jwks.validator_config("orders-api"))?;
/// ```
pub struct MockJwksServer {
    server: MockServer,
}

impl MockJwksServer {
    /// Start a server publishing `keys`.
    pub async fn start(keys: &[&TestSigningKey]) -> Self {
        Self::start_with_document(jwks_document(keys)).await
    }

    /// Start a server publishing an arbitrary JSON document.
    pub async fn start_with_document(document: Value) -> Self {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(JWKS_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(document))
            .mount(&server)
            .await;
        Self { server }
    }

    /// Start a server whose JWKS endpoint answers with `status` and no keys.
    pub async fn start_failing(status: u16) -> Self {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(JWKS_PATH))
            .respond_with(ResponseTemplate::new(status))
            .mount(&server)
            .await;
        Self { server }
    }

    /// Replace the published key set.
    pub async fn publish(&self, keys: &[&TestSigningKey]) {
        self.server.reset().await;
        Mock::given(method("GET"))
            .and(path(JWKS_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(jwks_document(keys)))
            .mount(&self.server)
            .await;
    }

    /// Full JWKS URL (plain HTTP).
    pub fn jwks_url(&self) -> String {
        format!("{}{}", self.server.uri(), JWKS_PATH)
    }

    /// Validator configuration pointing at this server.
    pub fn validator_config(&self, expected_audience: &str) -> ValidatorConfig {
        ValidatorConfig::new_insecure_for_tests(&self.jwks_url(), expected_audience)
            .expect("mock JWKS URL is a valid endpoint")
    }

    /// Number of JWKS fetches received since start (or the last `publish`).
    pub async fn fetch_count(&self) -> usize {
        self.server
            .received_requests()
            .await
            .map(|requests| requests.len())
            .unwrap_or(0)
    }

    /// The underlying wiremock server, for custom mocks.
    pub fn server(&self) -> &MockServer {
        &self.server
    }
}
