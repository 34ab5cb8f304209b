//! Token client error types.

use thiserror::Error;

/// Errors that can occur while configuring or running a token request.
///
/// - `ConfigurationInvalid` is raised at construction time and is fatal:
///   fix the configuration and construct again.
/// - `RequestFailed` is transient; the caller may retry with backoff.
/// - `InvalidResponse` means the server answered 2xx with a body that is
///   not a JSON token response.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    /// A credential or client setting failed validation.
    #[error("Configuration error: {0}")]
    ConfigurationInvalid(String),

    /// The token endpoint could not be reached or answered non-2xx.
    #[error("Token request failed: {message}")]
    RequestFailed {
        /// HTTP status, when the server answered at all.
        status: Option<u16>,
        /// Underlying cause.
        message: String,
    },

    /// Token response body could not be parsed.
    #[error("Invalid token response: {0}")]
    InvalidResponse(String),
}

impl TokenError {
    /// Returns `true` if retrying the same request could succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            TokenError::RequestFailed { status, .. } => match status {
                None => true,
                Some(code) => *code >= 500 || *code == 429 || *code == 408,
            },
            TokenError::ConfigurationInvalid(_) | TokenError::InvalidResponse(_) => false,
        }
    }
}
