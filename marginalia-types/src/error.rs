//! Error types for all marginalia crates.
//!
//! Stream-level failures (non-200 status, structured errors inside the body)
//! are not errors in this sense: they end the stream with
//! [`StreamOutcome::Failed`](crate::StreamOutcome::Failed).

use std::time::Duration;

use thiserror::Error;

/// Errors opening a request to the text-generation API.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum ProviderError {
    /// HTTP or network request failed.
    #[error("request failed: {0}")]
    RequestFailed(String),

    /// Request timed out before a response arrived.
    #[error("timeout after {0:?}")]
    Timeout(Duration),

    /// The request could not be built (bad URL, unserializable body).
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Catch-all for other errors.
    #[error("{0}")]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

impl ProviderError {
    /// Whether retrying this request might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ProviderError::RequestFailed(_) | ProviderError::Timeout(_)
        )
    }
}

/// Errors loading client configuration.
#[non_exhaustive]
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// A required environment variable is not set.
    #[error("missing required setting: {0}")]
    Missing(String),

    /// A setting is present but cannot be parsed.
    #[error("invalid value for {var}: {reason}")]
    Invalid {
        /// The offending variable.
        var: String,
        /// Why it was rejected.
        reason: String,
    },
}
