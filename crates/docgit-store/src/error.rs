use docgit_gateway::GatewayError;
use docgit_types::{ObjectHash, ObjectType, TypeError};

/// Errors from object store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// No object with this hash (and type, if one was given).
    #[error("object not found: {0}")]
    NotFound(ObjectHash),

    /// The object type cannot be stored.
    #[error("invalid object type: {0}")]
    InvalidType(ObjectType),

    /// A lookup that must be unique matched several documents.
    #[error("too many results: {count} documents share one object key")]
    TooManyResults { count: u64 },

    #[error(transparent)]
    Gateway(#[from] GatewayError),

    /// Payload encoding or decoding failure.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// A stored document does not have the shape of an object document.
    #[error("invalid object document: {0}")]
    InvalidDocument(String),
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

impl From<TypeError> for StoreError {
    fn from(e: TypeError) -> Self {
        Self::InvalidDocument(e.to_string())
    }
}

impl From<base64::DecodeError> for StoreError {
    fn from(e: base64::DecodeError) -> Self {
        Self::Serialization(e.to_string())
    }
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
