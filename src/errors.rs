/*!
 * Error types for the lingoflow engine.
 *
 * This module contains custom error types for different parts of the engine,
 * using the thiserror crate for ergonomic error definitions.
 */

use thiserror::Error;

/// Errors that can occur when talking to a translation provider
#[derive(Error, Debug)]
pub enum ProviderError {
    /// Error with authentication (invalid or rejected credentials)
    #[error("authentication error: {0}")]
    AuthenticationError(String),

    /// The request itself was invalid and will never succeed as-is
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The provider rejected the request due to rate limiting
    #[error("rate limit exceeded: {0}")]
    RateLimitExceeded(String),

    /// Error returned by the API itself
    #[error("API responded with error: {status_code} - {message}")]
    ApiError {
        /// HTTP status code
        status_code: u16,
        /// Error message from the API
        message: String,
    },

    /// The request did not complete within the configured timeout
    #[error("request timed out: {0}")]
    Timeout(String),

    /// Error establishing or maintaining a connection
    #[error("connection error: {0}")]
    ConnectionError(String),

    /// The provider returned a response the client could not use
    /// (unparseable body, or a batch whose length does not match the input)
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl ProviderError {
    /// Whether a retry of the same request may succeed.
    ///
    /// Rate limits, server errors (408/429/5xx), timeouts, connection
    /// failures and malformed responses are transient. Authentication and
    /// invalid-request errors are permanent and must not consume retry budget.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::RateLimitExceeded(_)
            | Self::Timeout(_)
            | Self::ConnectionError(_)
            | Self::InvalidResponse(_) => true,
            Self::ApiError { status_code, .. } => {
                matches!(status_code, 408 | 429 | 500 | 502 | 503 | 504)
            }
            Self::AuthenticationError(_) | Self::InvalidRequest(_) => false,
        }
    }

    /// Map an HTTP error status to the matching error variant
    pub fn from_status(status_code: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        match status_code {
            401 | 403 => Self::AuthenticationError(message),
            429 => Self::RateLimitExceeded(message),
            400 | 404 => Self::InvalidRequest(message),
            408 => Self::Timeout(message),
            _ => Self::ApiError {
                status_code,
                message,
            },
        }
    }
}

/// Errors produced by the retry executor around a provider call
#[derive(Error, Debug)]
pub enum RetryError {
    /// The first occurrence of a non-retryable provider error
    #[error("non-retryable provider error: {0}")]
    Fatal(#[source] ProviderError),

    /// Every allowed attempt failed with a retryable error
    #[error("all {attempts} attempts exhausted, last error: {last}")]
    AllRetriesExhausted {
        /// Number of network attempts made
        attempts: u32,
        /// The error from the final attempt
        #[source]
        last: ProviderError,
    },

    /// The run was cancelled before or during an attempt
    #[error("operation cancelled")]
    Cancelled,
}

/// Errors that can occur in the on-disk translation cache.
///
/// These are recovered locally (a corrupt partition reads as an empty
/// partition) and never surface to translation callers.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Error reading or writing a partition file
    #[error("cache I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A partition file failed to parse
    #[error("corrupt cache partition at {path}: {reason}")]
    Corrupt {
        /// Path of the affected partition file
        path: String,
        /// Parse failure description
        reason: String,
    },

    /// An entry batch failed to serialize
    #[error("cache serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Top-level errors surfaced by the translation engine
#[derive(Error, Debug)]
pub enum EngineError {
    /// Configuration holds no enabled provider tier
    #[error("no enabled provider tiers configured")]
    NoTiersEnabled,

    /// A forced provider is not among the enabled tiers
    #[error("provider {0} is not configured or not enabled")]
    ProviderNotConfigured(String),

    /// Every tier was exhausted with translation units still outstanding
    #[error("all providers exhausted with {} unresolved keys: {}", keys.len(), keys.join(", "))]
    AllProvidersExhausted {
        /// Keys that no tier managed to translate
        keys: Vec<String>,
    },

    /// The run was cancelled
    #[error("translation run cancelled")]
    Cancelled,
}
