use docgit_gateway::GatewayError;
use thiserror::Error;

/// Errors from metadata operations.
#[derive(Debug, Error)]
pub enum MetaError {
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    /// A payload could not be encoded or decoded.
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for MetaError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}

/// Result alias for metadata operations.
pub type MetaResult<T> = Result<T, MetaError>;
