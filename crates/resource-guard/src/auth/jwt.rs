//! Bearer token validation against a JWKS.
//!
//! # Security
//!
//! - Tokens are size-checked BEFORE parsing (DoS prevention)
//! - The verification algorithm must be permitted by the resolved key's
//!   metadata; the header `alg` alone is never trusted (alg-confusion)
//! - `exp` and `aud` are required; `exp` and `nbf` are checked with a
//!   bounded leeway that defaults to zero
//! - Callers get a `ValidationError` kind only; decode details are logged
//!   at debug level

use crate::auth::algorithms::{allowed_algorithms, decoding_key, parse_algorithm};
use crate::auth::claims::Claims;
use crate::auth::jwks::{CachingJwksClient, JwksClient, KeyResolver};
use crate::errors::{ConfigurationInvalid, ValidationError};
use crate::observability::metrics::record_validation;
use common::config::{parse_https_endpoint, Url};
use common::jwt::{peek_header, JwtValidationError, DEFAULT_LEEWAY, MAX_LEEWAY};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, Validation};
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::instrument;

// =============================================================================
// Validator Configuration
// =============================================================================

/// Immutable validator settings, checked at construction.
#[derive(Clone, PartialEq, Eq)]
pub struct ValidatorConfig {
    jwks_endpoint: Url,
    expected_audience: String,
    leeway: Duration,
}

impl fmt::Debug for ValidatorConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidatorConfig")
            .field("jwks_endpoint", &self.jwks_endpoint.as_str())
            .field("expected_audience", &self.expected_audience)
            .field("leeway", &self.leeway)
            .finish()
    }
}

impl ValidatorConfig {
    /// Validate and build the configuration with the default leeway.
    ///
    /// # Arguments
    ///
    /// * `jwks_endpoint` - Absolute `https` URL of the JWKS document
    /// * `expected_audience` - Non-empty audience every token must carry
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationInvalid` naming the first invalid field.
    pub fn new(
        jwks_endpoint: &str,
        expected_audience: impl Into<String>,
    ) -> Result<Self, ConfigurationInvalid> {
        let jwks_endpoint = parse_https_endpoint("jwks_endpoint", jwks_endpoint)
            .map_err(|e| ConfigurationInvalid(e.to_string()))?;
        Self::build(jwks_endpoint, expected_audience.into())
    }

    /// Build a configuration that may point at a plain-HTTP JWKS endpoint.
    ///
    /// **Note**: Only for tests against local mock servers.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationInvalid` for a relative URL or empty audience.
    #[cfg(any(test, feature = "test-utils"))]
    pub fn new_insecure_for_tests(
        jwks_endpoint: &str,
        expected_audience: impl Into<String>,
    ) -> Result<Self, ConfigurationInvalid> {
        let jwks_endpoint = common::config::parse_endpoint("jwks_endpoint", jwks_endpoint)
            .map_err(|e| ConfigurationInvalid(e.to_string()))?;
        Self::build(jwks_endpoint, expected_audience.into())
    }

    fn build(jwks_endpoint: Url, expected_audience: String) -> Result<Self, ConfigurationInvalid> {
        if expected_audience.trim().is_empty() {
            return Err(ConfigurationInvalid(
                "expected_audience cannot be empty".to_string(),
            ));
        }

        Ok(Self {
            jwks_endpoint,
            expected_audience,
            leeway: DEFAULT_LEEWAY,
        })
    }

    /// Replace the `exp` leeway.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationInvalid` if `leeway` exceeds `MAX_LEEWAY`.
    pub fn with_leeway(mut self, leeway: Duration) -> Result<Self, ConfigurationInvalid> {
        if leeway > MAX_LEEWAY {
            return Err(ConfigurationInvalid(format!(
                "leeway must not exceed {} seconds, got {}",
                MAX_LEEWAY.as_secs(),
                leeway.as_secs()
            )));
        }
        self.leeway = leeway;
        Ok(self)
    }

    /// JWKS endpoint.
    #[must_use]
    pub fn jwks_endpoint(&self) -> &Url {
        &self.jwks_endpoint
    }

    /// Audience every token must carry.
    #[must_use]
    pub fn expected_audience(&self) -> &str {
        &self.expected_audience
    }

    /// Clock-skew tolerance applied to `exp`.
    #[must_use]
    pub fn leeway(&self) -> Duration {
        self.leeway
    }
}

// =============================================================================
// Token Validator
// =============================================================================

/// Validates bearer tokens against keys from a [`KeyResolver`].
///
/// Holds no per-token state; the only shared state is whatever cache the
/// resolver keeps.
#[derive(Clone)]
pub struct TokenValidator {
    config: Arc<ValidatorConfig>,
    resolver: Arc<dyn KeyResolver>,
}

impl fmt::Debug for TokenValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenValidator")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl TokenValidator {
    /// Create a validator that fetches the JWKS on every validation.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationInvalid` if the HTTP client cannot be built.
    pub fn new(config: ValidatorConfig) -> Result<Self, ConfigurationInvalid> {
        let client = JwksClient::new(config.jwks_endpoint().clone())?;
        Ok(Self::with_resolver(config, Arc::new(client)))
    }

    /// Create a validator that caches the JWKS for `cache_ttl`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationInvalid` if the HTTP client cannot be built.
    pub fn with_cache(
        config: ValidatorConfig,
        cache_ttl: Duration,
    ) -> Result<Self, ConfigurationInvalid> {
        let client = JwksClient::new(config.jwks_endpoint().clone())?;
        let caching = CachingJwksClient::with_ttl(client, cache_ttl);
        Ok(Self::with_resolver(config, Arc::new(caching)))
    }

    /// Create a validator with a caller-supplied key resolver.
    #[must_use]
    pub fn with_resolver(config: ValidatorConfig, resolver: Arc<dyn KeyResolver>) -> Self {
        Self {
            config: Arc::new(config),
            resolver,
        }
    }

    /// The validator's configuration.
    #[must_use]
    pub fn config(&self) -> &ValidatorConfig {
        &self.config
    }

    /// Validate a token and return its claims.
    ///
    /// # Security Checks
    ///
    /// 1. Size and structure check before any decoding
    /// 2. Read `alg` and `kid` from the unverified header
    /// 3. Resolve the signing key by `kid`
    /// 4. Require the header `alg` to be permitted by the key
    /// 5. Verify the signature with that single algorithm
    /// 6. Validate `exp` and `nbf` (with leeway) and `aud`
    ///
    /// # Errors
    ///
    /// Returns the `ValidationError` kind of the first failed check.
    #[instrument(skip_all)]
    pub async fn validate(&self, token: &str) -> Result<Claims, ValidationError> {
        let start = Instant::now();
        let result = self.validate_inner(token).await;

        match &result {
            Ok(_) => {
                tracing::debug!(target: "resource_guard.auth.jwt", "Token validated successfully");
                record_validation("success", start.elapsed());
            }
            Err(e) => {
                tracing::debug!(target: "resource_guard.auth.jwt", outcome = e.as_str(), "Token rejected");
                record_validation(e.as_str(), start.elapsed());
            }
        }

        result
    }

    /// Boolean view of [`TokenValidator::validate`].
    pub async fn is_valid(&self, token: &str) -> bool {
        self.validate(token).await.is_ok()
    }

    async fn validate_inner(&self, token: &str) -> Result<Claims, ValidationError> {
        // 1-2. Size check and unverified header
        let header = peek_header(token).map_err(|e| {
            tracing::debug!(target: "resource_guard.auth.jwt", error = ?e, "Token header inspection failed");
            match e {
                JwtValidationError::MissingKid => ValidationError::KeyNotFound,
                JwtValidationError::TokenTooLarge | JwtValidationError::MalformedToken => {
                    ValidationError::MalformedToken
                }
            }
        })?;

        let alg = parse_algorithm(&header.alg).ok_or_else(|| {
            tracing::debug!(target: "resource_guard.auth.jwt", alg = %header.alg, "Unsupported token algorithm");
            ValidationError::AlgorithmMismatch
        })?;

        // 3. Resolve key
        let jwk = self.resolver.resolve(&header.kid).await.map_err(|e| {
            tracing::debug!(target: "resource_guard.auth.jwt", kid = %header.kid, error = %e, "Key resolution failed");
            ValidationError::from(e)
        })?;

        // 4. Algorithm must be bound to the key
        if !allowed_algorithms(&jwk).contains(&alg) {
            tracing::warn!(
                target: "resource_guard.auth.jwt",
                kid = %header.kid,
                alg = ?alg,
                kty = %jwk.kty,
                "Token algorithm not permitted for signing key"
            );
            return Err(ValidationError::AlgorithmMismatch);
        }

        let key = decoding_key(&jwk, alg).ok_or_else(|| {
            tracing::warn!(target: "resource_guard.auth.jwt", kid = %header.kid, "Signing key has unusable components");
            ValidationError::KeyNotFound
        })?;

        // 5-6. Signature and claims
        let mut validation = Validation::new(alg);
        validation.leeway = self.config.leeway.as_secs();
        validation.validate_nbf = true;
        validation.set_audience(&[self.config.expected_audience.as_str()]);
        validation.set_required_spec_claims(&["exp", "aud"]);

        let token_data = decode::<Claims>(token, &key, &validation).map_err(|e| {
            tracing::debug!(target: "resource_guard.auth.jwt", error = %e, "Token verification failed");
            map_decode_error(e.kind())
        })?;

        Ok(token_data.claims)
    }
}

/// Map a `jsonwebtoken` failure onto a validation kind.
fn map_decode_error(kind: &ErrorKind) -> ValidationError {
    match kind {
        ErrorKind::InvalidSignature => ValidationError::SignatureInvalid,
        ErrorKind::ExpiredSignature => ValidationError::TokenExpired,
        ErrorKind::ImmatureSignature => ValidationError::TokenNotYetValid,
        ErrorKind::InvalidAudience => ValidationError::AudienceMismatch,
        ErrorKind::MissingRequiredClaim(claim) if claim == "aud" => {
            ValidationError::AudienceMismatch
        }
        ErrorKind::InvalidAlgorithm | ErrorKind::InvalidAlgorithmName => {
            ValidationError::AlgorithmMismatch
        }
        ErrorKind::InvalidKeyFormat | ErrorKind::InvalidEcdsaKey | ErrorKind::InvalidRsaKey(_) => {
            ValidationError::KeyNotFound
        }
        _ => ValidationError::MalformedToken,
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::auth::jwks::{Jwk, JwksDocument, StaticKeyResolver};
    use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};

    const JWKS_URL: &str = "https://auth.example.com/.well-known/jwks.json";

    fn rsa_jwk(kid: &str) -> Jwk {
        Jwk {
            kty: "RSA".to_string(),
            kid: Some(kid.to_string()),
            alg: Some("RS256".to_string()),
            key_use: Some("sig".to_string()),
            n: Some("ueZ4lXIAOKxZwetut0Ck6dtbbkNvrybRvqUFjyqYeZCbNLYUBW_jVeBI18t3mGN8jfqKkrZPdr8BB_Aedsxns9QkgsJOZy9YnL-hel6N1VPT4c_s509PXYyeHjj58RGYJySImrqC_G_H6si3QxZvr8hjR2RgzCovxPaXX2gXwwag4fSYxgBK-yCUHVwGCes4wG9iSMakLxIK13B8fr1Qf6l1UZDQYBBo5xexhlxPAh5TrgS2YSvLDxPgsM3Eecqavs9d106gIS8dOyf-0AJ-ZAjLHIRYlJ8EiFv25gVERz7kQF0ls34WbE6ML9NiSWXo7hnNC-q0VMWTblExU4Va5w".to_string()),
            e: Some("AQAB".to_string()),
            ..Jwk::default()
        }
    }

    fn validator_with(keys: Vec<Jwk>) -> TokenValidator {
        let config = ValidatorConfig::new(JWKS_URL, "orders-api").unwrap();
        let resolver = StaticKeyResolver::new(JwksDocument { keys });
        TokenValidator::with_resolver(config, Arc::new(resolver))
    }

    fn unsigned_token(header: &str) -> String {
        let header_b64 = URL_SAFE_NO_PAD.encode(header);
        let payload_b64 =
            URL_SAFE_NO_PAD.encode(r#"{"sub":"svc","aud":"orders-api","exp":4102444800}"#);
        format!("{header_b64}.{payload_b64}.c2lnbmF0dXJl")
    }

    // =========================================================================
    // ValidatorConfig
    // =========================================================================

    #[test]
    fn test_config_valid() {
        let config = ValidatorConfig::new(JWKS_URL, "orders-api").unwrap();
        assert_eq!(config.jwks_endpoint().as_str(), JWKS_URL);
        assert_eq!(config.expected_audience(), "orders-api");
        assert_eq!(config.leeway(), DEFAULT_LEEWAY);
    }

    #[test]
    fn test_config_rejects_http_endpoint() {
        let err = ValidatorConfig::new("http://auth.example.com/jwks", "orders-api").unwrap_err();
        assert!(err.0.contains("https"), "got {err}");
    }

    #[test]
    fn test_config_rejects_relative_or_empty_endpoint() {
        assert!(ValidatorConfig::new("", "orders-api").is_err());
        assert!(ValidatorConfig::new("/jwks.json", "orders-api").is_err());
    }

    #[test]
    fn test_config_rejects_empty_audience() {
        let err = ValidatorConfig::new(JWKS_URL, "").unwrap_err();
        assert!(err.0.contains("expected_audience"));
        assert!(ValidatorConfig::new(JWKS_URL, "   ").is_err());
    }

    #[test]
    fn test_config_leeway_bounds() {
        let config = ValidatorConfig::new(JWKS_URL, "orders-api").unwrap();
        assert_eq!(
            config
                .clone()
                .with_leeway(Duration::from_secs(0))
                .unwrap()
                .leeway(),
            Duration::ZERO
        );
        assert!(config.clone().with_leeway(MAX_LEEWAY).is_ok());
        assert!(config
            .with_leeway(MAX_LEEWAY + Duration::from_secs(1))
            .is_err());
    }

    #[test]
    fn test_insecure_config_accepts_http() {
        assert!(ValidatorConfig::new_insecure_for_tests("http://127.0.0.1:9/jwks", "aud").is_ok());
        assert!(ValidatorConfig::new_insecure_for_tests("http://127.0.0.1:9/jwks", "").is_err());
    }

    // =========================================================================
    // Pre-verification failures
    // =========================================================================

    #[tokio::test]
    async fn test_empty_token_is_malformed() {
        let validator = validator_with(vec![rsa_jwk("k1")]);
        assert_eq!(
            validator.validate("").await.unwrap_err(),
            ValidationError::MalformedToken
        );
        assert!(!validator.is_valid("").await);
    }

    #[tokio::test]
    async fn test_garbage_token_is_malformed() {
        let validator = validator_with(vec![rsa_jwk("k1")]);
        for token in ["not-a-jwt", "a.b", "a.b.c.d", "!!!.@@@.###"] {
            assert_eq!(
                validator.validate(token).await.unwrap_err(),
                ValidationError::MalformedToken,
                "token {token}"
            );
        }
    }

    #[tokio::test]
    async fn test_missing_kid_is_key_not_found() {
        let validator = validator_with(vec![rsa_jwk("k1")]);
        let token = unsigned_token(r#"{"alg":"RS256","typ":"JWT"}"#);
        assert_eq!(
            validator.validate(&token).await.unwrap_err(),
            ValidationError::KeyNotFound
        );
    }

    #[tokio::test]
    async fn test_none_algorithm_rejected() {
        let validator = validator_with(vec![rsa_jwk("k1")]);
        let token = unsigned_token(r#"{"alg":"none","kid":"k1"}"#);
        assert_eq!(
            validator.validate(&token).await.unwrap_err(),
            ValidationError::AlgorithmMismatch
        );
    }

    #[tokio::test]
    async fn test_unknown_kid_is_key_not_found() {
        let validator = validator_with(vec![rsa_jwk("k1")]);
        let token = unsigned_token(r#"{"alg":"RS256","kid":"other"}"#);
        assert_eq!(
            validator.validate(&token).await.unwrap_err(),
            ValidationError::KeyNotFound
        );
    }

    #[tokio::test]
    async fn test_hmac_token_against_rsa_key_is_algorithm_mismatch() {
        let validator = validator_with(vec![rsa_jwk("k1")]);
        let token = unsigned_token(r#"{"alg":"HS256","kid":"k1"}"#);
        assert_eq!(
            validator.validate(&token).await.unwrap_err(),
            ValidationError::AlgorithmMismatch
        );
    }

    #[tokio::test]
    async fn test_key_declared_alg_restricts_family() {
        // Key pinned to RS256; a PS256 header is rejected before verification
        let validator = validator_with(vec![rsa_jwk("k1")]);
        let token = unsigned_token(r#"{"alg":"PS256","kid":"k1"}"#);
        assert_eq!(
            validator.validate(&token).await.unwrap_err(),
            ValidationError::AlgorithmMismatch
        );
    }

    #[tokio::test]
    async fn test_unusable_key_is_key_not_found() {
        let mut broken = rsa_jwk("k1");
        broken.n = None;
        let validator = validator_with(vec![broken]);
        let token = unsigned_token(r#"{"alg":"RS256","kid":"k1"}"#);
        assert_eq!(
            validator.validate(&token).await.unwrap_err(),
            ValidationError::KeyNotFound
        );
    }

    #[tokio::test]
    async fn test_bad_signature_is_signature_invalid() {
        let validator = validator_with(vec![rsa_jwk("k1")]);
        let token = unsigned_token(r#"{"alg":"RS256","kid":"k1"}"#);
        assert_eq!(
            validator.validate(&token).await.unwrap_err(),
            ValidationError::SignatureInvalid
        );
    }

    #[test]
    fn test_map_decode_error() {
        assert_eq!(
            map_decode_error(&ErrorKind::ExpiredSignature),
            ValidationError::TokenExpired
        );
        assert_eq!(
            map_decode_error(&ErrorKind::InvalidAudience),
            ValidationError::AudienceMismatch
        );
        assert_eq!(
            map_decode_error(&ErrorKind::MissingRequiredClaim("aud".to_string())),
            ValidationError::AudienceMismatch
        );
        assert_eq!(
            map_decode_error(&ErrorKind::MissingRequiredClaim("exp".to_string())),
            ValidationError::MalformedToken
        );
        assert_eq!(
            map_decode_error(&ErrorKind::InvalidSignature),
            ValidationError::SignatureInvalid
        );
        assert_eq!(
            map_decode_error(&ErrorKind::InvalidToken),
            ValidationError::MalformedToken
        );
    }
}
