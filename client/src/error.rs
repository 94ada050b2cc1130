//! Error types for the todosync client.

use std::time::Duration;
use thiserror::Error;

/// Result type alias for client operations.
pub type Result<T> = std::result::Result<T, ClientError>;

/// Errors that can occur in the client runtime.
#[derive(Debug, Error)]
pub enum ClientError {
    /// HTTP client error (connection refused, TLS, body read...)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success response from the sync server
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// The sync server did not answer in time
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    /// Local cache IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Cache keys become file names and must stay simple
    #[error("invalid cache key: {0}")]
    InvalidKey(String),

    /// Error raised by the store itself
    #[error(transparent)]
    Engine(#[from] todosync_engine::Error),
}

impl ClientError {
    /// Create an API error from status and message
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    /// Whether a mutation targeted an item that does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Engine(e) if e.is_not_found())
    }

    /// HTTP status if this is an API error.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}
