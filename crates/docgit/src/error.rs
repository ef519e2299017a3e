use thiserror::Error;

#[derive(Debug, Error)]
pub enum DocError {
    #[error("store error: {0}")]
    Store(#[from] docgit_store::StoreError),

    #[error("ref error: {0}")]
    Ref(#[from] docgit_refs::RefError),

    #[error("metadata error: {0}")]
    Meta(#[from] docgit_meta::MetaError),

    #[error("gateway error: {0}")]
    Gateway(#[from] docgit_gateway::GatewayError),
}

impl DocError {
    /// Whether this is a missing object, reference or database.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::Store(e) => e.is_not_found(),
            Self::Ref(e) => e.is_not_found(),
            Self::Meta(_) => false,
            Self::Gateway(e) => e.is_not_found(),
        }
    }
}

pub type DocResult<T> = Result<T, DocError>;
