//! Mock OAuth2 token endpoint

use common::secret::SecretString;
use serde_json::json;
use token_client::ClientCredentials;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Path the mock serves tokens at.
pub const TOKEN_PATH: &str = "/oauth/token";

/// A 36-character client ID accepted by `ClientCredentials`.
pub const TEST_CLIENT_ID: &str = "3f2a7c1e-9b4d-4e8a-a1c6-5d0f2b7e9c31";

/// Client secret used by [`MockTokenServer::credentials`].
pub const TEST_CLIENT_SECRET: &str = "test-client-secret";

/// Mock token endpoint.
pub struct MockTokenServer {
    server: MockServer,
}

impl MockTokenServer {
    /// Start a server with no mocks mounted.
    pub async fn start() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    /// Start a server that issues `access_token` to every POST.
    pub async fn issuing(access_token: &str) -> Self {
        let server = Self::start().await;
        server
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": access_token,
                "token_type": "Bearer",
                "expires_in": 3600
            })))
            .await;
        server
    }

    /// Mount a response for POSTs to the token path.
    pub async fn respond_with(&self, template: ResponseTemplate) {
        Mock::given(method("POST"))
            .and(path(TOKEN_PATH))
            .respond_with(template)
            .mount(&self.server)
            .await;
    }

    /// Full token endpoint URL (plain HTTP).
    pub fn token_url(&self) -> String {
        format!("{}{}", self.server.uri(), TOKEN_PATH)
    }

    /// Credentials pointing at this server with the given scopes.
    pub fn credentials(&self, scope: &[&str]) -> ClientCredentials {
        ClientCredentials::with_insecure_endpoint(
            TEST_CLIENT_ID,
            SecretString::from(TEST_CLIENT_SECRET),
            scope.iter().map(|s| (*s).to_string()).collect(),
            &self.token_url(),
        )
        .expect("test credentials are valid")
    }

    /// Bodies of every request received, as text.
    pub async fn received_bodies(&self) -> Vec<String> {
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .map(|r| String::from_utf8_lossy(&r.body).into_owned())
            .collect()
    }

    /// The underlying wiremock server.
    pub fn server(&self) -> &MockServer {
        &self.server
    }
}
