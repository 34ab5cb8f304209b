//! Resource guard server configuration.
//!
//! Configuration is loaded from environment variables. URL and audience
//! checks happen when the values are turned into a `ValidatorConfig`.

use crate::auth::jwks::MAX_CACHE_TTL;
use crate::auth::{TokenValidator, ValidatorConfig};
use crate::errors::ConfigurationInvalid;
use common::jwt::{DEFAULT_LEEWAY, MAX_LEEWAY};
use std::collections::HashMap;
use std::env;
use std::time::Duration;
use thiserror::Error;

/// Default HTTP bind address.
pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:8080";

/// Default JWKS cache TTL in seconds.
pub const DEFAULT_JWKS_CACHE_TTL_SECONDS: u64 = 300;

/// Default graceful shutdown drain in seconds.
pub const DEFAULT_DRAIN_SECONDS: u64 = 5;

/// Maximum graceful shutdown drain in seconds.
pub const MAX_DRAIN_SECONDS: u64 = 300;

/// Resource guard configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// JWKS endpoint URL (must be https).
    pub jwks_url: String,

    /// Audience every accepted token must carry.
    pub expected_audience: String,

    /// Server bind address (default: "0.0.0.0:8080").
    pub bind_address: String,

    /// JWKS cache TTL. Zero disables caching (fetch per validation).
    pub jwks_cache_ttl: Duration,

    /// Leeway applied to `exp` (default 0, max 600s).
    pub jwt_leeway: Duration,

    /// Time to keep serving after a shutdown signal (default 5s, max 300s).
    pub drain_period: Duration,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid JWKS cache TTL configuration: {0}")]
    InvalidJwksCacheTtl(String),

    #[error("Invalid JWT leeway configuration: {0}")]
    InvalidJwtLeeway(String),

    #[error("Invalid drain period configuration: {0}")]
    InvalidDrainPeriod(String),
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
        let jwks_url = vars
            .get("JWKS_URL")
            .ok_or_else(|| ConfigError::MissingEnvVar("JWKS_URL".to_string()))?
            .clone();

        let expected_audience = vars
            .get("EXPECTED_AUDIENCE")
            .ok_or_else(|| ConfigError::MissingEnvVar("EXPECTED_AUDIENCE".to_string()))?
            .clone();

        let bind_address = vars
            .get("BIND_ADDRESS")
            .cloned()
            .unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_string());

        let jwks_cache_ttl = if let Some(value_str) = vars.get("JWKS_CACHE_TTL_SECONDS") {
            let value: u64 = value_str.parse().map_err(|e| {
                ConfigError::InvalidJwksCacheTtl(format!(
                    "JWKS_CACHE_TTL_SECONDS must be a non-negative integer, got '{value_str}': {e}"
                ))
            })?;

            if value > MAX_CACHE_TTL.as_secs() {
                return Err(ConfigError::InvalidJwksCacheTtl(format!(
                    "JWKS_CACHE_TTL_SECONDS must not exceed {} seconds, got {}",
                    MAX_CACHE_TTL.as_secs(),
                    value
                )));
            }

            Duration::from_secs(value)
        } else {
            Duration::from_secs(DEFAULT_JWKS_CACHE_TTL_SECONDS)
        };

        let jwt_leeway = if let Some(value_str) = vars.get("JWT_LEEWAY_SECONDS") {
            let value: u64 = value_str.parse().map_err(|e| {
                ConfigError::InvalidJwtLeeway(format!(
                    "JWT_LEEWAY_SECONDS must be a non-negative integer, got '{value_str}': {e}"
                ))
            })?;

            if value > MAX_LEEWAY.as_secs() {
                return Err(ConfigError::InvalidJwtLeeway(format!(
                    "JWT_LEEWAY_SECONDS must not exceed {} seconds, got {}",
                    MAX_LEEWAY.as_secs(),
                    value
                )));
            }

            Duration::from_secs(value)
        } else {
            DEFAULT_LEEWAY
        };

        let drain_period = if let Some(value_str) = vars.get("DRAIN_SECONDS") {
            let value: u64 = value_str.parse().map_err(|e| {
                ConfigError::InvalidDrainPeriod(format!(
                    "DRAIN_SECONDS must be a non-negative integer, got '{value_str}': {e}"
                ))
            })?;

            if value > MAX_DRAIN_SECONDS {
                return Err(ConfigError::InvalidDrainPeriod(format!(
                    "DRAIN_SECONDS must not exceed {MAX_DRAIN_SECONDS} seconds, got {value}"
                )));
            }

            Duration::from_secs(value)
        } else {
            Duration::from_secs(DEFAULT_DRAIN_SECONDS)
        };

        Ok(Config {
            jwks_url,
            expected_audience,
            bind_address,
            jwks_cache_ttl,
            jwt_leeway,
            drain_period,
        })
    }

    /// Build the validator configuration from these values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationInvalid` for a non-https JWKS URL, an empty
    /// audience, or an out-of-range leeway.
    pub fn validator_config(&self) -> Result<ValidatorConfig, ConfigurationInvalid> {
        ValidatorConfig::new(&self.jwks_url, self.expected_audience.clone())?
            .with_leeway(self.jwt_leeway)
    }

    /// Build the token validator: caching when `jwks_cache_ttl` is non-zero,
    /// fetching per validation otherwise.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationInvalid` if the validator configuration is invalid.
    pub fn build_validator(&self) -> Result<TokenValidator, ConfigurationInvalid> {
        let validator_config = self.validator_config()?;
        if self.jwks_cache_ttl.is_zero() {
            TokenValidator::new(validator_config)
        } else {
            TokenValidator::with_cache(validator_config, self.jwks_cache_ttl)
        }
    }
}
