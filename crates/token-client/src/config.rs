//! `fetch-token` configuration.
//!
//! Loaded from environment variables. The client secret is redacted in
//! Debug output.

use crate::credentials::ClientCredentials;
use crate::errors::TokenError;
use crate::requester::DEFAULT_HTTP_TIMEOUT;
use common::secret::SecretString;
use std::collections::HashMap;
use std::env;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Maximum configurable HTTP timeout in seconds.
pub const MAX_HTTP_TIMEOUT_SECONDS: u64 = 300;

/// Token client configuration.
#[derive(Clone)]
pub struct Config {
    /// OAuth client identifier.
    pub client_id: String,

    /// OAuth client secret.
    pub client_secret: SecretString,

    /// Requested scopes (`SCOPE`, space separated).
    pub scope: Vec<String>,

    /// Token endpoint URL.
    pub token_url: String,

    /// HTTP request timeout (default: 10 seconds).
    pub http_timeout: Duration,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("scope", &self.scope)
            .field("token_url", &self.token_url)
            .field("http_timeout", &self.http_timeout)
            .finish()
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid HTTP timeout configuration: {0}")]
    InvalidHttpTimeout(String),
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a required variable is missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&env::vars().collect())
    }

    /// Load configuration from a `HashMap` (for testing).
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a required variable is missing or invalid.
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let required = |name: &str| {
            vars.get(name)
                .cloned()
                .ok_or_else(|| ConfigError::MissingEnvVar(name.to_string()))
        };

        let client_id = required("CLIENT_ID")?;
        let client_secret = SecretString::from(required("CLIENT_SECRET")?);
        let scope = required("SCOPE")?
            .split_whitespace()
            .map(ToString::to_string)
            .collect();
        let token_url = required("TOKEN_URL")?;

        let http_timeout = if let Some(value_str) = vars.get("HTTP_TIMEOUT_SECONDS") {
            let value: u64 = value_str.parse().map_err(|e| {
                ConfigError::InvalidHttpTimeout(format!(
                    "HTTP_TIMEOUT_SECONDS must be a valid positive integer, got '{value_str}': {e}"
                ))
            })?;

            if value == 0 {
                return Err(ConfigError::InvalidHttpTimeout(
                    "HTTP_TIMEOUT_SECONDS must be greater than 0".to_string(),
                ));
            }

            if value > MAX_HTTP_TIMEOUT_SECONDS {
                return Err(ConfigError::InvalidHttpTimeout(format!(
                    "HTTP_TIMEOUT_SECONDS must not exceed {MAX_HTTP_TIMEOUT_SECONDS}, got {value}"
                )));
            }

            Duration::from_secs(value)
        } else {
            DEFAULT_HTTP_TIMEOUT
        };

        Ok(Config {
            client_id,
            client_secret,
            scope,
            token_url,
            http_timeout,
        })
    }

    /// Validate the loaded values into client credentials.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::ConfigurationInvalid` if any field is invalid.
    pub fn credentials(&self) -> Result<ClientCredentials, TokenError> {
        ClientCredentials::new(
            self.client_id.clone(),
            self.client_secret.clone(),
            self.scope.clone(),
            &self.token_url,
        )
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use common::secret::ExposeSecret;

    fn base_vars() -> HashMap<String, String> {
        HashMap::from([
            (
                "CLIENT_ID".to_string(),
                "3f2a7c1e-9b4d-4e8a-a1c6-5d0f2b7e9c31".to_string(),
            ),
            ("CLIENT_SECRET".to_string(), "shh".to_string()),
            ("SCOPE".to_string(), "orders:read  orders:write".to_string()),
            (
                "TOKEN_URL".to_string(),
                "https://auth.example.com/oauth2/token".to_string(),
            ),
        ])
    }

    #[test]
    fn test_from_vars_defaults() {
        let config = Config::from_vars(&base_vars()).unwrap();

        assert_eq!(config.client_secret.expose_secret(), "shh");
        assert_eq!(config.scope, vec!["orders:read", "orders:write"]);
        assert_eq!(config.http_timeout, DEFAULT_HTTP_TIMEOUT);
        assert!(config.credentials().is_ok());
    }

    #[test]
    fn test_from_vars_missing_required() {
        for name in ["CLIENT_ID", "CLIENT_SECRET", "SCOPE", "TOKEN_URL"] {
            let mut vars = base_vars();
            vars.remove(name);
            let result = Config::from_vars(&vars);
            assert!(
                matches!(&result, Err(ConfigError::MissingEnvVar(v)) if v == name),
                "expected missing {name}"
            );
        }
    }

    #[test]
    fn test_from_vars_custom_timeout() {
        let mut vars = base_vars();
        vars.insert("HTTP_TIMEOUT_SECONDS".to_string(), "3".to_string());
        let config = Config::from_vars(&vars).unwrap();
        assert_eq!(config.http_timeout, Duration::from_secs(3));
    }

    #[test]
    fn test_from_vars_invalid_timeout() {
        for bad in ["0", "abc", "-5", "301"] {
            let mut vars = base_vars();
            vars.insert("HTTP_TIMEOUT_SECONDS".to_string(), bad.to_string());
            assert!(
                matches!(
                    Config::from_vars(&vars),
                    Err(ConfigError::InvalidHttpTimeout(_))
                ),
                "expected rejection for {bad}"
            );
        }
    }

    #[test]
    fn test_empty_scope_fails_credentials() {
        let mut vars = base_vars();
        vars.insert("SCOPE".to_string(), "   ".to_string());
        let config = Config::from_vars(&vars).unwrap();
        assert!(matches!(
            config.credentials(),
            Err(TokenError::ConfigurationInvalid(_))
        ));
    }

    #[test]
    fn test_debug_redacts_secret() {
        let config = Config::from_vars(&base_vars()).unwrap();
        let debug_str = format!("{config:?}");
        assert!(debug_str.contains("[REDACTED]"));
        assert!(!debug_str.contains("shh"));
    }
}
