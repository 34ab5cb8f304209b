//! OAuth 2.0 client-credentials token request.
//!
//! Sends a single form-encoded POST to the configured token endpoint and
//! extracts `access_token` from the JSON response.
//!
//! # Behavior
//!
//! - Exactly one outbound request per call; no retries (wrap the call in
//!   your own backoff if needed, see [`TokenError::is_retryable`])
//! - Request and connect timeouts are always set
//! - A 2xx response without `access_token` yields `Ok(None)`
//!
//! # Security
//!
//! - Client secret and token are held as `SecretString` and never logged
//! - Error response bodies are logged at trace level only

use crate::credentials::ClientCredentials;
use crate::errors::TokenError;
use crate::observability::{record_token_request, RequestOutcome};
use common::secret::{ExposeSecret, SecretString};
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::fmt;
use std::time::{Duration, Instant};
use tracing::{debug, instrument, trace, warn};

/// Default HTTP request timeout.
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Default connection timeout for HTTP client.
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Grant type sent with every request.
const GRANT_TYPE: &str = "client_credentials";

// =============================================================================
// Access Token
// =============================================================================

/// Access token returned by the authorization server.
///
/// Only `secret()` is guaranteed; the other fields are echoed when the
/// server includes them.
#[derive(Clone)]
pub struct AccessToken {
    secret: SecretString,
    token_type: Option<String>,
    expires_in: Option<Duration>,
    scope: Option<String>,
}

impl AccessToken {
    /// The bearer token value.
    #[must_use]
    pub fn secret(&self) -> &SecretString {
        &self.secret
    }

    /// Token type (usually `Bearer`).
    #[must_use]
    pub fn token_type(&self) -> Option<&str> {
        self.token_type.as_deref()
    }

    /// Lifetime reported by the server.
    #[must_use]
    pub fn expires_in(&self) -> Option<Duration> {
        self.expires_in
    }

    /// Granted scope, when it differs from or confirms the request.
    #[must_use]
    pub fn scope(&self) -> Option<&str> {
        self.scope.as_deref()
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessToken")
            .field("secret", &"[REDACTED]")
            .field("token_type", &self.token_type)
            .field("expires_in", &self.expires_in)
            .field("scope", &self.scope)
            .finish()
    }
}

// =============================================================================
// OAuth Response Types
// =============================================================================

/// OAuth 2.0 token response. Every field is optional so that a response
/// without `access_token` is distinguishable from an unparseable one.
///
/// Fields of an unexpected type are dropped rather than failing the whole
/// response; only `access_token` decides the outcome.
#[derive(Deserialize)]
struct OAuthTokenResponse {
    #[serde(default, deserialize_with = "lenient_string")]
    access_token: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    token_type: Option<String>,
    #[serde(default, deserialize_with = "lenient_seconds")]
    expires_in: Option<u64>,
    #[serde(default, deserialize_with = "lenient_string")]
    scope: Option<String>,
}

/// A JSON string, or `None` for any other value.
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => Some(s),
        _ => None,
    })
}

/// A non-negative integer given as a number or a numeric string
/// (`3600` or `"3600"`), or `None` for any other value.
fn lenient_seconds<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Number(n)) => n.as_u64(),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}

impl fmt::Debug for OAuthTokenResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OAuthTokenResponse")
            .field("access_token", &self.access_token.as_ref().map(|_| "[REDACTED]"))
            .field("token_type", &self.token_type)
            .field("expires_in", &self.expires_in)
            .field("scope", &self.scope)
            .finish()
    }
}

impl OAuthTokenResponse {
    fn into_access_token(self) -> Option<AccessToken> {
        let token = self.access_token.filter(|t| !t.is_empty())?;
        Some(AccessToken {
            secret: SecretString::from(token),
            token_type: self.token_type,
            expires_in: self.expires_in.map(Duration::from_secs),
            scope: self.scope,
        })
    }
}

// =============================================================================
// Token Requester
// =============================================================================

/// Performs the client-credentials grant for one set of credentials.
///
/// Stateless between calls and safe to share across tasks.
#[derive(Clone, Debug)]
pub struct TokenRequester {
    credentials: ClientCredentials,
    http_client: reqwest::Client,
}

impl TokenRequester {
    /// Create a requester with the default HTTP timeout.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::ConfigurationInvalid` if the HTTP client cannot be built.
    pub fn new(credentials: ClientCredentials) -> Result<Self, TokenError> {
        Self::with_http_timeout(credentials, DEFAULT_HTTP_TIMEOUT)
    }

    /// Create a requester with a custom HTTP request timeout.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::ConfigurationInvalid` if the timeout is zero or
    /// the HTTP client cannot be built.
    pub fn with_http_timeout(
        credentials: ClientCredentials,
        timeout: Duration,
    ) -> Result<Self, TokenError> {
        if timeout.is_zero() {
            return Err(TokenError::ConfigurationInvalid(
                "HTTP timeout must be greater than zero".into(),
            ));
        }

        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(DEFAULT_CONNECT_TIMEOUT.min(timeout))
            .build()
            .map_err(|e| {
                TokenError::ConfigurationInvalid(format!("Failed to build HTTP client: {e}"))
            })?;

        Ok(Self {
            credentials,
            http_client,
        })
    }

    /// The credentials this requester sends.
    #[must_use]
    pub fn credentials(&self) -> &ClientCredentials {
        &self.credentials
    }

    /// Obtain an access token via the client-credentials grant.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(token))` - 2xx JSON response with `access_token`
    /// - `Ok(None)` - 2xx JSON response without `access_token`
    ///
    /// # Errors
    ///
    /// - `TokenError::RequestFailed` - Connection error, timeout, or non-2xx status
    /// - `TokenError::InvalidResponse` - 2xx response whose body is not a JSON token response
    #[instrument(skip_all, fields(client_id = %self.credentials.client_id()))]
    pub async fn obtain_token(&self) -> Result<Option<AccessToken>, TokenError> {
        let start = Instant::now();
        let result = self.send_token_request().await;

        let outcome = match &result {
            Ok(Some(_)) => RequestOutcome::Success,
            Ok(None) => RequestOutcome::MissingToken,
            Err(TokenError::RequestFailed { status: Some(_), .. }) => RequestOutcome::HttpError,
            Err(TokenError::RequestFailed { status: None, .. }) => RequestOutcome::TransportError,
            Err(TokenError::InvalidResponse(_) | TokenError::ConfigurationInvalid(_)) => {
                RequestOutcome::InvalidResponse
            }
        };
        record_token_request(outcome, start.elapsed());

        result
    }

    async fn send_token_request(&self) -> Result<Option<AccessToken>, TokenError> {
        let url = self.credentials.token_endpoint().clone();

        debug!(
            target: "token_client.requester",
            url = %url,
            "Requesting token"
        );

        let scope = self.credentials.scope_param();
        let form_body = [
            ("grant_type", GRANT_TYPE),
            ("client_id", self.credentials.client_id()),
            (
                "client_secret",
                self.credentials.client_secret().expose_secret(),
            ),
            ("scope", scope.as_str()),
        ];

        let response = self
            .http_client
            .post(url)
            .header(reqwest::header::ACCEPT, "application/json")
            .form(&form_body)
            .send()
            .await
            .map_err(|e| {
                warn!(target: "token_client.requester", error = %e, "HTTP request failed");
                TokenError::RequestFailed {
                    status: None,
                    message: e.to_string(),
                }
            })?;

        let status = response.status();

        if !status.is_success() {
            // Body may echo request details; keep it out of the error value
            let body = response.text().await.unwrap_or_else(|e| {
                trace!(target: "token_client.requester", error = %e, "Failed to read error response body");
                "<failed to read body>".to_string()
            });
            warn!(
                target: "token_client.requester",
                status = %status,
                "Token endpoint returned error status"
            );
            trace!(
                target: "token_client.requester",
                body = %body,
                "Token endpoint error response body"
            );
            return Err(TokenError::RequestFailed {
                status: Some(status.as_u16()),
                message: format!("Token endpoint returned {status}"),
            });
        }

        let bytes = response.bytes().await.map_err(|e| {
            warn!(target: "token_client.requester", error = %e, "Failed to read token response body");
            TokenError::RequestFailed {
                status: Some(status.as_u16()),
                message: e.to_string(),
            }
        })?;

        let token_response: OAuthTokenResponse = serde_json::from_slice(&bytes).map_err(|e| {
            warn!(target: "token_client.requester", error = %e, "Failed to parse token response");
            TokenError::InvalidResponse(e.to_string())
        })?;

        let token = token_response.into_access_token();
        if token.is_none() {
            warn!(
                target: "token_client.requester",
                "Token response did not contain an access_token"
            );
        } else {
            debug!(target: "token_client.requester", "Token acquired successfully");
        }

        Ok(token)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_string_contains, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const CLIENT_ID: &str = "3f2a7c1e-9b4d-4e8a-a1c6-5d0f2b7e9c31";

    fn requester_for(server: &MockServer) -> TokenRequester {
        let creds = ClientCredentials::with_insecure_endpoint(
            CLIENT_ID,
            SecretString::from("test-secret"),
            vec!["orders:read".to_string(), "orders:write".to_string()],
            &format!("{}/oauth2/token", server.uri()),
        )
        .unwrap();
        TokenRequester::new(creds).unwrap()
    }

    #[test]
    fn test_oauth_response_without_token_is_none() {
        let response: OAuthTokenResponse =
            serde_json::from_str(r#"{"token_type":"Bearer"}"#).unwrap();
        assert!(response.into_access_token().is_none());
    }

    #[test]
    fn test_oauth_response_empty_token_is_none() {
        let response: OAuthTokenResponse =
            serde_json::from_str(r#"{"access_token":""}"#).unwrap();
        assert!(response.into_access_token().is_none());
    }

    #[test]
    fn test_oauth_response_string_expires_in() {
        let response: OAuthTokenResponse =
            serde_json::from_str(r#"{"access_token":"abc123","expires_in":"3599"}"#).unwrap();
        let token = response.into_access_token().unwrap();
        assert_eq!(token.secret().expose_secret(), "abc123");
        assert_eq!(token.expires_in(), Some(Duration::from_secs(3599)));
    }

    #[test]
    fn test_oauth_response_ignores_malformed_optional_fields() {
        let response: OAuthTokenResponse = serde_json::from_str(
            r#"{"access_token":"abc123","expires_in":"soon","token_type":7,"scope":["a","b"]}"#,
        )
        .unwrap();
        let token = response.into_access_token().unwrap();
        assert_eq!(token.secret().expose_secret(), "abc123");
        assert!(token.expires_in().is_none());
        assert!(token.token_type().is_none());
        assert!(token.scope().is_none());
    }

    #[test]
    fn test_oauth_response_non_string_token_is_none() {
        let response: OAuthTokenResponse =
            serde_json::from_str(r#"{"access_token":12345,"expires_in":-1}"#).unwrap();
        assert!(response.into_access_token().is_none());
    }

    #[test]
    fn test_oauth_response_debug_redacts_token() {
        let response: OAuthTokenResponse =
            serde_json::from_str(r#"{"access_token":"very-secret-token"}"#).unwrap();
        let debug_str = format!("{response:?}");
        assert!(!debug_str.contains("very-secret-token"));
    }

    #[test]
    fn test_access_token_debug_redacts() {
        let token = AccessToken {
            secret: SecretString::from("secret-token"),
            token_type: Some("Bearer".into()),
            expires_in: Some(Duration::from_secs(3600)),
            scope: None,
        };
        let debug_str = format!("{token:?}");
        assert!(debug_str.contains("[REDACTED]"));
        assert!(!debug_str.contains("secret-token"));
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let creds = ClientCredentials::with_insecure_endpoint(
            CLIENT_ID,
            SecretString::from("s"),
            vec!["a".into()],
            "http://127.0.0.1:1/token",
        )
        .unwrap();
        assert!(matches!(
            TokenRequester::with_http_timeout(creds, Duration::ZERO),
            Err(TokenError::ConfigurationInvalid(_))
        ));
    }

    #[tokio::test]
    async fn test_obtain_token_sends_form_body() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/oauth2/token"))
            .and(header("content-type", "application/x-www-form-urlencoded"))
            .and(body_string_contains("grant_type=client_credentials"))
            .and(body_string_contains(format!("client_id={CLIENT_ID}")))
            .and(body_string_contains("client_secret=test-secret"))
            .and(body_string_contains("scope=orders%3Aread+orders%3Awrite"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "abc123",
                "token_type": "Bearer",
                "expires_in": 3600,
                "scope": "orders:read orders:write"
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let token = requester_for(&mock_server)
            .obtain_token()
            .await
            .unwrap()
            .expect("token present");

        assert_eq!(token.secret().expose_secret(), "abc123");
        assert_eq!(token.token_type(), Some("Bearer"));
        assert_eq!(token.expires_in(), Some(Duration::from_secs(3600)));
        assert_eq!(token.scope(), Some("orders:read orders:write"));
    }

    #[tokio::test]
    async fn test_obtain_token_server_error_is_request_failed() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/oauth2/token"))
            .respond_with(ResponseTemplate::new(500))
            .expect(1)
            .mount(&mock_server)
            .await;

        let err = requester_for(&mock_server).obtain_token().await.unwrap_err();
        assert!(
            matches!(err, TokenError::RequestFailed { status: Some(500), .. }),
            "got {err:?}"
        );
    }

    #[tokio::test]
    async fn test_obtain_token_does_not_leak_error_body() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/oauth2/token"))
            .respond_with(
                ResponseTemplate::new(401).set_body_string("invalid_client: test-secret"),
            )
            .mount(&mock_server)
            .await;

        let err = requester_for(&mock_server).obtain_token().await.unwrap_err();
        assert!(!err.to_string().contains("test-secret"));
    }
}
