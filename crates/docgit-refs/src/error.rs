//! Error types for reference operations.

use docgit_gateway::GatewayError;
use docgit_types::TypeError;
use thiserror::Error;

/// Errors that can occur during reference operations.
#[derive(Debug, Error)]
pub enum RefError {
    /// The reference was not found.
    #[error("ref not found: {name}")]
    NotFound { name: String },

    /// A compare-and-set found a different value than expected.
    #[error("reference has changed: {name}")]
    ReferenceHasChanged { name: String },

    /// More than one document carries this reference name.
    #[error("too many results: {count} documents named {name}")]
    TooManyResults { name: String, count: u64 },

    #[error(transparent)]
    Gateway(#[from] GatewayError),

    /// A stored document does not have the shape of a reference.
    #[error("invalid reference document: {0}")]
    InvalidDocument(String),
}

impl RefError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Whether a compare-and-set lost to a concurrent change.
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::ReferenceHasChanged { .. })
    }
}

impl From<TypeError> for RefError {
    fn from(e: TypeError) -> Self {
        Self::InvalidDocument(e.to_string())
    }
}

/// Convenience type alias for ref operations.
pub type Result<T> = std::result::Result<T, RefError>;
