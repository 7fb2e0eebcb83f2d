//! Transport error types.

use crate::server_error::ServerError;
use thiserror::Error;

/// Result type for transport operations.
pub type Result<T> = std::result::Result<T, TransportError>;

/// Transport errors.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Invalid transport configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid endpoint address or request path.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Request failed after all retries were exhausted.
    #[error("Request failed after {attempts} attempts: {message}")]
    RetryExhausted {
        /// Number of attempts made.
        attempts: u32,
        /// Last error message.
        message: String,
    },

    /// The server answered with an error status.
    #[error(transparent)]
    Server(#[from] ServerError),

    /// The request signer rejected the request.
    #[error("Signing error: {0}")]
    Signing(String),

    /// Underlying HTTP client error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl TransportError {
    /// Check if this error is worth retrying at network level.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Http(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            Self::Io(_) => true,
            _ => false,
        }
    }

    /// Check if this is a timeout error.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Http(e) if e.is_timeout())
    }

    /// Get the HTTP status code if the error came from a server response.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Server(e) => e.status(),
            Self::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_code_from_server_error() {
        let err = TransportError::from(ServerError::EmptyBody { status: 503 });
        assert_eq!(err.status_code(), Some(503));
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_config_error_display() {
        let err = TransportError::Config("no addresses".to_string());
        assert_eq!(err.to_string(), "Configuration error: no addresses");
        assert_eq!(err.status_code(), None);
    }
}
