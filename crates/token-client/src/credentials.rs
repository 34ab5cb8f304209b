//! Client credentials for the OAuth 2.0 client-credentials grant.
//!
//! All fields are validated when the value is built; there is no way to
//! hold a partially valid `ClientCredentials`.

use crate::errors::TokenError;
use common::config::{parse_https_endpoint, EndpointError, Url};
use common::secret::{ExposeSecret, SecretString};
use std::fmt;

/// Required length of a client identifier (a hyphenated UUID).
pub const CLIENT_ID_LENGTH: usize = 36;

/// Immutable, validated client credentials.
///
/// The client secret is stored as a `SecretString` and redacted in Debug
/// output.
#[derive(Clone)]
pub struct ClientCredentials {
    client_id: String,
    client_secret: SecretString,
    scope: Vec<String>,
    token_endpoint: Url,
}

impl fmt::Debug for ClientCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientCredentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("scope", &self.scope)
            .field("token_endpoint", &self.token_endpoint.as_str())
            .finish()
    }
}

impl ClientCredentials {
    /// Validate and build client credentials.
    ///
    /// # Arguments
    ///
    /// * `client_id` - Exactly 36 characters
    /// * `client_secret` - Non-empty secret
    /// * `scope` - Non-empty list of non-empty scope strings
    /// * `token_endpoint` - Absolute `https` URL of the token endpoint
    ///
    /// # Errors
    ///
    /// Returns `TokenError::ConfigurationInvalid` naming the first field that
    /// fails validation.
    pub fn new(
        client_id: impl Into<String>,
        client_secret: SecretString,
        scope: Vec<String>,
        token_endpoint: &str,
    ) -> Result<Self, TokenError> {
        let client_id = validate_client_id(client_id.into())?;
        let client_secret = validate_client_secret(client_secret)?;
        let scope = validate_scope(scope)?;
        let token_endpoint =
            parse_https_endpoint("token_endpoint", token_endpoint).map_err(endpoint_error)?;

        Ok(Self {
            client_id,
            client_secret,
            scope,
            token_endpoint,
        })
    }

    /// Build credentials that may point at a plain-HTTP endpoint.
    ///
    /// **Note**: Only for tests against local mock servers. Every other field
    /// is validated exactly as in [`ClientCredentials::new`].
    ///
    /// # Errors
    ///
    /// Returns `TokenError::ConfigurationInvalid` for any invalid field.
    #[cfg(any(test, feature = "test-utils"))]
    pub fn with_insecure_endpoint(
        client_id: impl Into<String>,
        client_secret: SecretString,
        scope: Vec<String>,
        token_endpoint: &str,
    ) -> Result<Self, TokenError> {
        let client_id = validate_client_id(client_id.into())?;
        let client_secret = validate_client_secret(client_secret)?;
        let scope = validate_scope(scope)?;
        let token_endpoint = common::config::parse_endpoint("token_endpoint", token_endpoint)
            .map_err(endpoint_error)?;

        Ok(Self {
            client_id,
            client_secret,
            scope,
            token_endpoint,
        })
    }

    /// The client identifier.
    #[must_use]
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// The client secret.
    #[must_use]
    pub fn client_secret(&self) -> &SecretString {
        &self.client_secret
    }

    /// The requested scopes, in order.
    #[must_use]
    pub fn scope(&self) -> &[String] {
        &self.scope
    }

    /// The scopes in their wire form (space-joined).
    #[must_use]
    pub fn scope_param(&self) -> String {
        self.scope.join(" ")
    }

    /// The token endpoint.
    #[must_use]
    pub fn token_endpoint(&self) -> &Url {
        &self.token_endpoint
    }
}

fn validate_client_id(client_id: String) -> Result<String, TokenError> {
    if client_id.is_empty() {
        return Err(TokenError::ConfigurationInvalid(
            "client_id cannot be empty".into(),
        ));
    }
    let len = client_id.chars().count();
    if len != CLIENT_ID_LENGTH {
        return Err(TokenError::ConfigurationInvalid(format!(
            "client_id must be {CLIENT_ID_LENGTH} characters long, got {len}"
        )));
    }
    Ok(client_id)
}

fn validate_client_secret(client_secret: SecretString) -> Result<SecretString, TokenError> {
    if client_secret.expose_secret().is_empty() {
        return Err(TokenError::ConfigurationInvalid(
            "client_secret cannot be empty".into(),
        ));
    }
    Ok(client_secret)
}

fn validate_scope(scope: Vec<String>) -> Result<Vec<String>, TokenError> {
    if scope.is_empty() {
        return Err(TokenError::ConfigurationInvalid(
            "scope must contain at least one entry".into(),
        ));
    }
    // Scopes are space-joined on the wire, so an entry with whitespace
    // would silently turn into several scopes.
    if let Some(position) = scope
        .iter()
        .position(|s| s.is_empty() || s.chars().any(char::is_whitespace))
    {
        return Err(TokenError::ConfigurationInvalid(format!(
            "scope entry {position} must be non-empty and contain no whitespace"
        )));
    }
    Ok(scope)
}

fn endpoint_error(e: EndpointError) -> TokenError {
    TokenError::ConfigurationInvalid(e.to_string())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    const CLIENT_ID: &str = "3f2a7c1e-9b4d-4e8a-a1c6-5d0f2b7e9c31";
    const TOKEN_URL: &str = "https://auth.example.com/oauth2/token";

    fn scopes(values: &[&str]) -> Vec<String> {
        values.iter().map(ToString::to_string).collect()
    }

    fn build(
        client_id: &str,
        secret: &str,
        scope: Vec<String>,
        url: &str,
    ) -> Result<ClientCredentials, TokenError> {
        ClientCredentials::new(client_id, SecretString::from(secret), scope, url)
    }

    #[test]
    fn test_valid_credentials() {
        let creds = build(CLIENT_ID, "secret", scopes(&["read", "write"]), TOKEN_URL).unwrap();

        assert_eq!(creds.client_id(), CLIENT_ID);
        assert_eq!(creds.client_secret().expose_secret(), "secret");
        assert_eq!(creds.scope(), &["read".to_string(), "write".to_string()]);
        assert_eq!(creds.scope_param(), "read write");
        assert_eq!(creds.token_endpoint().as_str(), TOKEN_URL);
    }

    #[test]
    fn test_client_id_wrong_length_rejected() {
        let err = build("short-id", "secret", scopes(&["read"]), TOKEN_URL).unwrap_err();
        assert!(
            matches!(&err, TokenError::ConfigurationInvalid(msg) if msg.contains("36")),
            "got {err:?}"
        );

        let long = "a".repeat(37);
        assert!(matches!(
            build(&long, "secret", scopes(&["read"]), TOKEN_URL),
            Err(TokenError::ConfigurationInvalid(_))
        ));
    }

    #[test]
    fn test_client_id_counts_characters_not_bytes() {
        // 36 characters, more than 36 bytes
        let id = format!("{}é", "a".repeat(35));
        assert_eq!(id.chars().count(), 36);
        assert!(build(&id, "secret", scopes(&["read"]), TOKEN_URL).is_ok());
    }

    #[test]
    fn test_empty_client_id_rejected() {
        assert!(matches!(
            build("", "secret", scopes(&["read"]), TOKEN_URL),
            Err(TokenError::ConfigurationInvalid(msg)) if msg.contains("empty")
        ));
    }

    #[test]
    fn test_empty_secret_rejected() {
        assert!(matches!(
            build(CLIENT_ID, "", scopes(&["read"]), TOKEN_URL),
            Err(TokenError::ConfigurationInvalid(msg)) if msg.contains("client_secret")
        ));
    }

    #[test]
    fn test_empty_scope_list_rejected() {
        assert!(matches!(
            build(CLIENT_ID, "secret", Vec::new(), TOKEN_URL),
            Err(TokenError::ConfigurationInvalid(msg)) if msg.contains("scope")
        ));
    }

    #[test]
    fn test_empty_scope_entry_rejected() {
        assert!(matches!(
            build(CLIENT_ID, "secret", scopes(&["read", ""]), TOKEN_URL),
            Err(TokenError::ConfigurationInvalid(msg)) if msg.contains("scope entry 1")
        ));
    }

    #[test]
    fn test_scope_entry_with_space_rejected() {
        assert!(matches!(
            build(CLIENT_ID, "secret", scopes(&["read write"]), TOKEN_URL),
            Err(TokenError::ConfigurationInvalid(_))
        ));
    }

    #[test]
    fn test_http_endpoint_rejected() {
        assert!(matches!(
            build(CLIENT_ID, "secret", scopes(&["read"]), "http://auth.example.com/token"),
            Err(TokenError::ConfigurationInvalid(msg)) if msg.contains("https")
        ));
    }

    #[test]
    fn test_relative_endpoint_rejected() {
        assert!(matches!(
            build(CLIENT_ID, "secret", scopes(&["read"]), "oauth2/token"),
            Err(TokenError::ConfigurationInvalid(_))
        ));
    }

    #[test]
    fn test_insecure_constructor_still_validates_fields() {
        assert!(ClientCredentials::with_insecure_endpoint(
            CLIENT_ID,
            SecretString::from("secret"),
            scopes(&["read"]),
            "http://127.0.0.1:9999/token",
        )
        .is_ok());

        assert!(ClientCredentials::with_insecure_endpoint(
            "bad",
            SecretString::from("secret"),
            scopes(&["read"]),
            "http://127.0.0.1:9999/token",
        )
        .is_err());
    }

    #[test]
    fn test_debug_redacts_secret() {
        let creds = build(CLIENT_ID, "super-secret-value", scopes(&["read"]), TOKEN_URL).unwrap();
        let debug_str = format!("{creds:?}");

        assert!(debug_str.contains("[REDACTED]"));
        assert!(!debug_str.contains("super-secret-value"));
        assert!(debug_str.contains(CLIENT_ID));
    }
}
