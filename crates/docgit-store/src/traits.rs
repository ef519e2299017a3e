use async_trait::async_trait;
use docgit_types::{EncodedObject, ObjectHash, ObjectType};

use crate::document::ObjectIter;
use crate::error::StoreResult;

/// Storage for git objects.
///
/// Implementations must satisfy these invariants:
/// - Writes are upserts keyed by `(hash, type)`, so retries are idempotent.
/// - Delta-encoded objects are rejected with `InvalidType`.
/// - A read matching more than one document fails with `TooManyResults`
///   rather than picking one. Existence and size checks go by hash alone
///   and accept any match, since one hash may be stored under several types.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// A fresh, empty object for callers to fill in before storing.
    fn new_encoded_object(&self) -> EncodedObject {
        EncodedObject::default()
    }

    /// Store an object and return its hash.
    async fn set_encoded_object(&self, object: &EncodedObject) -> StoreResult<ObjectHash>;

    /// Read an object by hash and type. [`ObjectType::Any`] matches by hash
    /// alone.
    ///
    /// Returns `Err(StoreError::NotFound)` if nothing matches.
    async fn encoded_object(&self, kind: ObjectType, hash: ObjectHash) -> StoreResult<EncodedObject>;

    /// `Ok(())` if an object with this hash exists under any type.
    async fn has_encoded_object(&self, hash: ObjectHash) -> StoreResult<()>;

    /// Payload size of the object, or 0 if it does not exist.
    async fn encoded_object_size(&self, hash: ObjectHash) -> StoreResult<u64>;

    /// Iterate every object of one type.
    ///
    /// Only blobs, commits and tags are iterable; any other type yields an
    /// empty iterator.
    async fn iter_encoded_objects(&self, kind: ObjectType) -> StoreResult<ObjectIter>;
}
