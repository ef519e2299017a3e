//! Error types for gateway operations.

use thiserror::Error;

/// Errors from the document-store gateway.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The database, collection, document or cursor does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// A database or collection with this name already exists.
    #[error("already exists: {0}")]
    AlreadyExists(String),

    /// The database could not be reached.
    #[error("transport error: {0}")]
    Transport(String),

    /// The database answered with an error.
    #[error("server error {status} (errorNum {code}): {message}")]
    Server {
        status: u16,
        code: i64,
        message: String,
    },

    /// Serialization or deserialization failure.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// A document is missing a field or has a field of the wrong shape.
    #[error("invalid document: {0}")]
    InvalidDocument(String),

    /// The gateway configuration is unusable.
    #[error("configuration error: {0}")]
    Config(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl GatewayError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    pub fn is_already_exists(&self) -> bool {
        matches!(self, Self::AlreadyExists(_))
    }
}

impl From<reqwest::Error> for GatewayError {
    fn from(e: reqwest::Error) -> Self {
        Self::Transport(e.to_string())
    }
}

impl From<serde_json::Error> for GatewayError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}

/// Result alias for gateway operations.
pub type GatewayResult<T> = Result<T, GatewayError>;
