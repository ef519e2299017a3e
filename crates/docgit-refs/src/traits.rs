//! The [`RefStore`] trait defining the reference storage interface.

use async_trait::async_trait;
use docgit_types::{Reference, ReferenceName};

use crate::document::RefIter;
use crate::error::Result;

/// Storage backend for named references.
///
/// Names follow git's hierarchical layout (`HEAD`, `refs/heads/*`,
/// `refs/tags/*`, `refs/remotes/{remote}/*`). Targets are either an object
/// hash or, for symbolic references, another reference name.
#[async_trait]
pub trait RefStore: Send + Sync {
    /// Create or overwrite a reference.
    async fn set_reference(&self, reference: &Reference) -> Result<()>;

    /// Set `new`, but only if the stored value under `old`'s name still
    /// resolves to `old`'s hash.
    ///
    /// Does nothing when `new` is `None`. Without `old` this is a plain
    /// [`set_reference`](Self::set_reference). A mismatch fails with
    /// `ReferenceHasChanged` and leaves `new` unwritten.
    ///
    /// The check and the write are separate round trips, so a writer racing
    /// between them is not detected.
    async fn check_and_set_reference(
        &self,
        new: Option<&Reference>,
        old: Option<&Reference>,
    ) -> Result<()>;

    /// Read a reference by name.
    ///
    /// Returns `Err(RefError::NotFound)` if it does not exist.
    async fn reference(&self, name: &ReferenceName) -> Result<Reference>;

    /// Iterate every reference, in no particular order.
    async fn iter_references(&self) -> Result<RefIter>;

    /// Delete a reference. Deleting a missing reference succeeds.
    async fn remove_reference(&self, name: &ReferenceName) -> Result<()>;

    /// Number of stored references.
    async fn count_loose_refs(&self) -> Result<u64>;

    /// Pack references. Nothing to do for document storage.
    async fn pack_refs(&self) -> Result<()> {
        Ok(())
    }
}
