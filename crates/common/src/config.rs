//! Endpoint validation shared by the token client and the resource guard.
//!
//! Both sides are configured with remote endpoints that carry credentials
//! or trust anchors (the token endpoint receives the client secret, the JWKS
//! endpoint supplies the keys that decide what a valid token is). Both must
//! be absolute `https` URLs.

pub use reqwest::Url;
use thiserror::Error;

/// Errors raised while validating a configured endpoint.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EndpointError {
    /// The endpoint value was empty.
    #[error("{field} cannot be empty")]
    Empty {
        /// Name of the configuration field.
        field: &'static str,
    },

    /// The endpoint is not an absolute URL with a host.
    #[error("{field} must be an absolute URL: {reason}")]
    NotAbsolute {
        /// Name of the configuration field.
        field: &'static str,
        /// Parser diagnostic.
        reason: String,
    },

    /// The endpoint does not use the `https` scheme.
    #[error("{field} must use https, got scheme '{scheme}'")]
    InsecureScheme {
        /// Name of the configuration field.
        field: &'static str,
        /// The scheme that was supplied.
        scheme: String,
    },
}

/// Parse `raw` as an absolute `https` URL.
///
/// # Errors
///
/// Returns [`EndpointError`] if the value is empty, not absolute, has no
/// host, or uses any scheme other than `https`.
pub fn parse_https_endpoint(field: &'static str, raw: &str) -> Result<Url, EndpointError> {
    let url = parse_endpoint(field, raw)?;
    if url.scheme() != "https" {
        return Err(EndpointError::InsecureScheme {
            field,
            scheme: url.scheme().to_string(),
        });
    }
    Ok(url)
}

/// Parse `raw` as an absolute `http` or `https` URL.
///
/// Only test harnesses (which serve mock endpoints over plain HTTP) should
/// reach for this; production constructors use [`parse_https_endpoint`].
///
/// # Errors
///
/// Returns [`EndpointError`] if the value is empty, not absolute, has no
/// host, or uses a non-HTTP scheme.
pub fn parse_endpoint(field: &'static str, raw: &str) -> Result<Url, EndpointError> {
    if raw.trim().is_empty() {
        return Err(EndpointError::Empty { field });
    }

    let url = Url::parse(raw).map_err(|e| EndpointError::NotAbsolute {
        field,
        reason: e.to_string(),
    })?;

    if !url.has_host() {
        return Err(EndpointError::NotAbsolute {
            field,
            reason: "missing host".to_string(),
        });
    }

    match url.scheme() {
        "https" | "http" => Ok(url),
        other => Err(EndpointError::InsecureScheme {
            field,
            scheme: other.to_string(),
        }),
    }
}
