//! Error types for bulk indexing.

use thiserror::Error;
use tidewater_transport::TransportError;

/// Bulk indexer error type.
#[derive(Error, Debug)]
pub enum BulkError {
    /// Invalid indexer configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The caller's context was cancelled.
    #[error("context canceled")]
    ContextCanceled,

    /// The caller's context deadline passed.
    #[error("context deadline exceeded")]
    ContextDeadline,

    /// The indexer has been closed.
    #[error("bulk indexer is closed")]
    Closed,

    /// The bulk response did not carry one entry per submitted item.
    #[error("bulk response has {actual} items, expected {expected}")]
    ResponseShape {
        /// Items in the flushed batch.
        expected: usize,
        /// Items in the response.
        actual: usize,
    },

    /// The flush request failed in the transport or was rejected as a whole.
    #[error("flush: {0}")]
    Transport(#[from] TransportError),

    /// Encoding or decoding error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl BulkError {
    /// Whether this error came from a context.
    pub fn is_context_error(&self) -> bool {
        matches!(self, Self::ContextCanceled | Self::ContextDeadline)
    }
}

/// Result type alias for bulk operations.
pub type Result<T> = std::result::Result<T, BulkError>;
