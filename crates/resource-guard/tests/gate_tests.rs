//! End-to-end tests for the bearer gate on a running resource guard.
//!
//! Each test spawns the real router on a random port, backed by a mock
//! JWKS endpoint, and talks to it over HTTP.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use auth_test_utils::{
    MockJwksServer, MockTokenServer, TestGuardServer, TestSigningKey, TestTokenBuilder,
    TEST_AUDIENCE,
};
use common::secret::ExposeSecret;
use reqwest::{header::WWW_AUTHENTICATE, StatusCode};
use resource_guard::handlers::ProtectedResponse;
use token_client::TokenRequester;

struct Harness {
    key: TestSigningKey,
    _jwks: MockJwksServer,
    server: TestGuardServer,
    client: reqwest::Client,
}

impl Harness {
    async fn start() -> Self {
        let key = TestSigningKey::ec_p256("ec-gate");
        let jwks = MockJwksServer::start(&[&key]).await;
        let server = TestGuardServer::spawn(&jwks.jwks_url(), TEST_AUDIENCE)
            .await
            .unwrap();

        Self {
            key,
            _jwks: jwks,
            server,
            client: reqwest::Client::new(),
        }
    }

    fn protected_url(&self) -> String {
        format!("{}/api/v1/protected", self.server.url())
    }

    async fn get_with(&self, authorization: Option<&str>) -> reqwest::Response {
        let mut request = self.client.get(self.protected_url());
        if let Some(value) = authorization {
            request = request.header(reqwest::header::AUTHORIZATION, value);
        }
        request.send().await.unwrap()
    }
}

async fn error_reason(response: reqwest::Response) -> String {
    let body: serde_json::Value = response.json().await.unwrap();
    body.get("error")
        .and_then(|v| v.as_str())
        .unwrap()
        .to_string()
}

#[tokio::test]
async fn test_missing_header_is_rejected() {
    let harness = Harness::start().await;

    let response = harness.get_with(None).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        response.headers().get(WWW_AUTHENTICATE).unwrap(),
        "Bearer realm=\"resource-guard\""
    );
    assert_eq!(error_reason(response).await, "Authorization header missing");
}

#[tokio::test]
async fn test_non_bearer_scheme_is_rejected() {
    let harness = Harness::start().await;

    for value in ["Basic dXNlcjpwYXNz", "Bearer", "Bearer a b", "bearer abc"] {
        let response = harness.get_with(Some(value)).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{value}");
        assert_eq!(error_reason(response).await, "Invalid token type", "{value}");
    }
}

#[tokio::test]
async fn test_expired_token_is_rejected() {
    let harness = Harness::start().await;
    let token = harness
        .key
        .sign(&TestTokenBuilder::new().expires_in(-3600).build());

    let response = harness.get_with(Some(&format!("Bearer {token}"))).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        response.headers().get(WWW_AUTHENTICATE).unwrap(),
        "Bearer realm=\"resource-guard\", error=\"invalid_token\""
    );
    assert_eq!(error_reason(response).await, "Token has expired");
}

#[tokio::test]
async fn test_wrong_audience_is_rejected() {
    let harness = Harness::start().await;
    let token = harness
        .key
        .sign(&TestTokenBuilder::new().for_audience("payments-api").build());

    let response = harness.get_with(Some(&format!("Bearer {token}"))).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(error_reason(response).await, "Invalid audience");
}

#[tokio::test]
async fn test_forged_token_is_rejected() {
    let harness = Harness::start().await;
    let stranger = TestSigningKey::ec_p256("ec-gate");
    let token = stranger.sign(&TestTokenBuilder::new().build());

    let response = harness.get_with(Some(&format!("Bearer {token}"))).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(error_reason(response).await, "Token is invalid");
}

#[tokio::test]
async fn test_valid_token_reaches_handler() {
    let harness = Harness::start().await;
    let token = harness.key.sign(
        &TestTokenBuilder::new()
            .for_subject("svc-billing")
            .with_scope("orders:read")
            .build(),
    );

    let response = harness.get_with(Some(&format!("Bearer {token}"))).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().get(WWW_AUTHENTICATE).is_none());
    let body: ProtectedResponse = response.json().await.unwrap();
    assert_eq!(
        body,
        ProtectedResponse {
            subject: "svc-billing".to_string(),
            scopes: vec!["orders:read".to_string()],
        }
    );
}

#[tokio::test]
async fn test_public_routes_need_no_token() {
    let harness = Harness::start().await;

    let health = harness
        .client
        .get(format!("{}/health", harness.server.url()))
        .send()
        .await
        .unwrap();
    assert_eq!(health.status(), StatusCode::OK);

    let metrics = harness
        .client
        .get(format!("{}/metrics", harness.server.url()))
        .send()
        .await
        .unwrap();
    assert_eq!(metrics.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_client_credentials_token_is_accepted() {
    // Full flow: obtain a token from the issuer, then present it
    let harness = Harness::start().await;
    let issued = harness.key.sign(
        &TestTokenBuilder::new()
            .for_subject("svc-billing")
            .with_scope("orders:read orders:write")
            .build(),
    );
    let issuer = MockTokenServer::issuing(&issued).await;
    let requester = TokenRequester::new(issuer.credentials(&["orders:read", "orders:write"]))
        .unwrap();

    let access_token = requester.obtain_token().await.unwrap().unwrap();
    let response = harness
        .client
        .get(harness.protected_url())
        .bearer_auth(access_token.secret().expose_secret())
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body: ProtectedResponse = response.json().await.unwrap();
    assert_eq!(body.scopes, vec!["orders:read", "orders:write"]);
}
