//! Signing key resolution from a JSON Web Key Set.
//!
//! The validator asks a [`KeyResolver`] for the key named by a token's `kid`.
//! Three resolvers are provided:
//!
//! - [`JwksClient`] fetches the JWKS on every lookup
//! - [`CachingJwksClient`] caches the JWKS with a TTL and refetches on
//!   expiry or when the `kid` is not in the cached set (key rotation)
//! - [`StaticKeyResolver`] serves a pinned, in-memory JWKS
//!
//! # Security
//!
//! - The JWKS endpoint is an HTTPS URL validated by `ValidatorConfig`
//! - Every fetch has request and connect timeouts
//! - Expired cache entries are never served

use crate::errors::{ConfigurationInvalid, ValidationError};
use crate::observability::metrics::record_jwks_fetch;
use async_trait::async_trait;
use common::config::Url;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::instrument;

/// Default cache TTL (5 minutes).
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(300);

/// Longest cache TTL a [`CachingJwksClient`] will use (24 hours).
pub const MAX_CACHE_TTL: Duration = Duration::from_secs(86_400);

/// Timeout for a JWKS fetch.
pub const JWKS_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

const JWKS_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

// =============================================================================
// JWKS Types
// =============================================================================

/// JSON Web Key as published in a JWKS document.
///
/// Every field is optional on the wire; which ones matter depends on `kty`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Jwk {
    /// Key type ("RSA", "EC", "OKP", "oct").
    #[serde(default)]
    pub kty: String,

    /// Key ID - used to select the correct key for verification.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kid: Option<String>,

    /// Algorithm the key is intended for.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alg: Option<String>,

    /// Key use ("sig" or "enc").
    #[serde(default, rename = "use", skip_serializing_if = "Option::is_none")]
    pub key_use: Option<String>,

    /// RSA modulus (base64url).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub n: Option<String>,

    /// RSA public exponent (base64url).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub e: Option<String>,

    /// Curve name for EC and OKP keys.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crv: Option<String>,

    /// EC x coordinate or OKP public key (base64url).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<String>,

    /// EC y coordinate (base64url).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<String>,
}

/// A JWKS document (`{"keys": [...]}`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwksDocument {
    /// List of JSON Web Keys.
    pub keys: Vec<Jwk>,
}

impl JwksDocument {
    /// Find the key with the given `kid`. The first match wins.
    #[must_use]
    pub fn find(&self, kid: &str) -> Option<&Jwk> {
        self.keys.iter().find(|k| k.kid.as_deref() == Some(kid))
    }
}

// =============================================================================
// Key Resolver
// =============================================================================

/// Errors from key resolution.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum KeyResolutionError {
    /// The key set has no key with the requested `kid`.
    #[error("No key with the requested kid")]
    NotFound,

    /// The key set could not be fetched or decoded.
    #[error("Failed to fetch JWKS: {0}")]
    FetchFailed(String),
}

impl From<KeyResolutionError> for ValidationError {
    fn from(e: KeyResolutionError) -> Self {
        match e {
            KeyResolutionError::NotFound => ValidationError::KeyNotFound,
            KeyResolutionError::FetchFailed(_) => ValidationError::KeyFetchFailed,
        }
    }
}

/// Resolves a signing key by `kid`.
///
/// Implementations must be safe to call concurrently.
#[async_trait]
pub trait KeyResolver: Send + Sync {
    /// Return the JWK whose `kid` matches.
    async fn resolve(&self, kid: &str) -> Result<Jwk, KeyResolutionError>;
}

// =============================================================================
// JwksClient
// =============================================================================

/// Fetches the JWKS from a remote endpoint on every lookup.
#[derive(Debug, Clone)]
pub struct JwksClient {
    /// URL to the JWKS endpoint.
    jwks_url: Url,

    /// HTTP client for fetching JWKS.
    http_client: reqwest::Client,
}

impl JwksClient {
    /// Create a new JWKS client.
    ///
    /// The URL is used as given; scheme checks belong to `ValidatorConfig`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationInvalid` if the HTTP client cannot be built.
    pub fn new(jwks_url: Url) -> Result<Self, ConfigurationInvalid> {
        let http_client = reqwest::Client::builder()
            .timeout(JWKS_FETCH_TIMEOUT)
            .connect_timeout(JWKS_CONNECT_TIMEOUT)
            .build()
            .map_err(|e| ConfigurationInvalid(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            jwks_url,
            http_client,
        })
    }

    /// The JWKS endpoint.
    #[must_use]
    pub fn jwks_url(&self) -> &Url {
        &self.jwks_url
    }

    /// Fetch and decode the JWKS document.
    ///
    /// # Errors
    ///
    /// Returns `KeyResolutionError::FetchFailed` on transport errors,
    /// timeouts, non-2xx responses, or an undecodable body.
    #[instrument(skip_all)]
    pub async fn fetch(&self) -> Result<JwksDocument, KeyResolutionError> {
        let start = Instant::now();
        let result = self.fetch_inner().await;
        record_jwks_fetch(result.is_ok(), start.elapsed());
        result
    }

    async fn fetch_inner(&self) -> Result<JwksDocument, KeyResolutionError> {
        tracing::debug!(target: "resource_guard.auth.jwks", url = %self.jwks_url, "Fetching JWKS");

        let response = self
            .http_client
            .get(self.jwks_url.clone())
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| {
                tracing::error!(target: "resource_guard.auth.jwks", error = %e, "Failed to fetch JWKS");
                KeyResolutionError::FetchFailed(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            tracing::error!(
                target: "resource_guard.auth.jwks",
                status = %status,
                "JWKS endpoint returned error"
            );
            return Err(KeyResolutionError::FetchFailed(format!(
                "JWKS endpoint returned {status}"
            )));
        }

        let jwks: JwksDocument = response.json().await.map_err(|e| {
            tracing::error!(target: "resource_guard.auth.jwks", error = %e, "Failed to parse JWKS response");
            KeyResolutionError::FetchFailed(e.to_string())
        })?;

        tracing::debug!(
            target: "resource_guard.auth.jwks",
            key_count = jwks.keys.len(),
            "JWKS fetched"
        );

        Ok(jwks)
    }
}

#[async_trait]
impl KeyResolver for JwksClient {
    async fn resolve(&self, kid: &str) -> Result<Jwk, KeyResolutionError> {
        let jwks = self.fetch().await?;
        jwks.find(kid).cloned().ok_or_else(|| {
            tracing::debug!(target: "resource_guard.auth.jwks", kid = %kid, "Key not found in JWKS");
            KeyResolutionError::NotFound
        })
    }
}

// =============================================================================
// CachingJwksClient
// =============================================================================

/// Cached JWKS data with expiry time.
struct CachedJwks {
    document: JwksDocument,
    expires_at: Instant,
}

/// JWKS resolver that caches the key set with a TTL.
///
/// A lookup is served from cache only while the entry is fresh and contains
/// the `kid`. An expired entry or an unknown `kid` triggers one refetch; a
/// `kid` still missing after that is `NotFound`.
pub struct CachingJwksClient {
    client: JwksClient,
    cache: RwLock<Option<CachedJwks>>,
    cache_ttl: Duration,
}

impl CachingJwksClient {
    /// Wrap a fetching client with the default TTL.
    #[must_use]
    pub fn new(client: JwksClient) -> Self {
        Self::with_ttl(client, DEFAULT_CACHE_TTL)
    }

    /// Wrap a fetching client with a custom TTL, capped at [`MAX_CACHE_TTL`].
    #[must_use]
    pub fn with_ttl(client: JwksClient, cache_ttl: Duration) -> Self {
        if cache_ttl > MAX_CACHE_TTL {
            tracing::warn!(
                target: "resource_guard.auth.jwks",
                requested_secs = cache_ttl.as_secs(),
                max_secs = MAX_CACHE_TTL.as_secs(),
                "JWKS cache TTL capped"
            );
        }

        Self {
            client,
            cache: RwLock::new(None),
            cache_ttl: cache_ttl.min(MAX_CACHE_TTL),
        }
    }

    /// Cache TTL.
    #[must_use]
    pub fn cache_ttl(&self) -> Duration {
        self.cache_ttl
    }

    /// Fetch the JWKS and replace the cache regardless of freshness.
    ///
    /// # Errors
    ///
    /// Returns `KeyResolutionError::FetchFailed` if the fetch fails; the
    /// previous cache entry is left in place.
    pub async fn force_refresh(&self) -> Result<(), KeyResolutionError> {
        self.refresh_cache().await.map(|_| ())
    }

    /// Drop the cached key set.
    pub async fn clear_cache(&self) {
        *self.cache.write().await = None;
    }

    async fn refresh_cache(&self) -> Result<JwksDocument, KeyResolutionError> {
        let document = self.client.fetch().await?;

        tracing::info!(
            target: "resource_guard.auth.jwks",
            key_count = document.keys.len(),
            "JWKS cache refreshed"
        );

        let mut cache = self.cache.write().await;
        // An unrepresentable expiry leaves nothing cached; lookups refetch
        *cache = Instant::now()
            .checked_add(self.cache_ttl)
            .map(|expires_at| CachedJwks {
                document: document.clone(),
                expires_at,
            });

        Ok(document)
    }
}

#[async_trait]
impl KeyResolver for CachingJwksClient {
    #[instrument(skip(self), fields(kid = %kid))]
    async fn resolve(&self, kid: &str) -> Result<Jwk, KeyResolutionError> {
        {
            let cache = self.cache.read().await;
            if let Some(cached) = cache.as_ref() {
                if cached.expires_at > Instant::now() {
                    if let Some(key) = cached.document.find(kid) {
                        tracing::debug!(target: "resource_guard.auth.jwks", kid = %kid, "JWKS cache hit");
                        return Ok(key.clone());
                    }
                    tracing::debug!(target: "resource_guard.auth.jwks", kid = %kid, "Key not in JWKS cache, refetching");
                }
            }
        }

        let document = self.refresh_cache().await?;
        document.find(kid).cloned().ok_or_else(|| {
            tracing::warn!(target: "resource_guard.auth.jwks", kid = %kid, "Key not found in JWKS after refresh");
            KeyResolutionError::NotFound
        })
    }
}

// =============================================================================
// StaticKeyResolver
// =============================================================================

/// Serves keys from a fixed, in-memory JWKS document.
#[derive(Debug, Clone)]
pub struct StaticKeyResolver {
    document: JwksDocument,
}

impl StaticKeyResolver {
    /// Pin the given key set.
    #[must_use]
    pub fn new(document: JwksDocument) -> Self {
        Self { document }
    }

    /// Pin a key set given as JWKS JSON.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationInvalid` if the JSON is not a JWKS document.
    pub fn from_json(json: &str) -> Result<Self, ConfigurationInvalid> {
        let document = serde_json::from_str(json)
            .map_err(|e| ConfigurationInvalid(format!("Invalid JWKS document: {e}")))?;
        Ok(Self::new(document))
    }
}

#[async_trait]
impl KeyResolver for StaticKeyResolver {
    async fn resolve(&self, kid: &str) -> Result<Jwk, KeyResolutionError> {
        self.document
            .find(kid)
            .cloned()
            .ok_or(KeyResolutionError::NotFound)
    }
}
