use async_trait::async_trait;
use docgit_types::ObjectHash;

use crate::error::MetaResult;
use crate::types::{Index, RepoConfig};

/// Storage for the shallow list, the staging index and the repository
/// config.
///
/// Every setter replaces the whole slot. Every getter returns the empty
/// value when the slot was never written.
#[async_trait]
pub trait MetaStore: Send + Sync {
    async fn set_shallow(&self, commits: &[ObjectHash]) -> MetaResult<()>;

    async fn shallow(&self) -> MetaResult<Vec<ObjectHash>>;

    async fn set_index(&self, index: &Index) -> MetaResult<()>;

    async fn index(&self) -> MetaResult<Index>;

    async fn set_config(&self, config: &RepoConfig) -> MetaResult<()>;

    async fn config(&self) -> MetaResult<RepoConfig>;
}
