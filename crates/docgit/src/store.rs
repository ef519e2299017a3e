//! The composed repository store.

use std::sync::Arc;

use async_trait::async_trait;
use docgit_gateway::{
    Gateway, GatewayConfig, MISC_COLLECTION, OBJECTS_COLLECTION, REFS_COLLECTION,
};
use docgit_meta::{DocumentMetaStore, Index, MetaResult, MetaStore, RepoConfig};
use docgit_refs::{DocumentRefStore, RefIter, RefStore};
use docgit_store::{DocumentObjectStore, ObjectIter, ObjectStore, StoreResult};
use docgit_types::{EncodedObject, ObjectHash, ObjectType, Reference, ReferenceName};
use tracing::{debug, info};

use crate::error::DocResult;

/// Branch HEAD points at in a freshly initialized repository.
pub const DEFAULT_BRANCH: &str = "master";

/// Everything a version-control engine needs from its storage.
#[async_trait]
pub trait Storer: ObjectStore + RefStore + MetaStore {
    /// Storage for the named submodule, if supported.
    async fn module(&self, name: &str) -> DocResult<Option<Arc<dyn Storer>>>;
}

/// Open (creating if needed) the repository database `database` at
/// `endpoint`.
///
/// Returns the store and whether the database was created by this call; a
/// created repository still needs [`DocStore::init`].
pub async fn open_store(endpoint: &str, database: &str) -> DocResult<(DocStore, bool)> {
    DocStore::open(GatewayConfig::new(endpoint, database)).await
}

/// Objects, references and metadata over one database connection.
#[derive(Clone, Debug)]
pub struct DocStore {
    gateway: Gateway,
    objects: DocumentObjectStore,
    refs: DocumentRefStore,
    meta: DocumentMetaStore,
}

impl DocStore {
    /// Connect over HTTP and open the configured repository.
    pub async fn open(config: GatewayConfig) -> DocResult<(Self, bool)> {
        Self::open_with(Gateway::connect(config)?).await
    }

    /// Open the repository through an existing gateway.
    ///
    /// Provisions the database and the `objects`, `refs` and `misc`
    /// collections. Any failure aborts the open; no partial store is
    /// returned.
    pub async fn open_with(gateway: Gateway) -> DocResult<(Self, bool)> {
        let (db, created) = gateway.open_database().await?;
        let objects = gateway.collection(Arc::clone(&db), OBJECTS_COLLECTION).await?;
        let refs = gateway.collection(Arc::clone(&db), REFS_COLLECTION).await?;
        let misc = gateway.collection(db, MISC_COLLECTION).await?;
        debug!(database = %gateway.config().database, created, "opened store");

        let store = Self {
            gateway,
            objects: DocumentObjectStore::new(objects),
            refs: DocumentRefStore::new(refs),
            meta: DocumentMetaStore::new(misc),
        };
        Ok((store, created))
    }

    /// Open the repository, initializing it if this call created it.
    pub async fn open_or_init(config: GatewayConfig) -> DocResult<Self> {
        let (store, created) = Self::open(config).await?;
        if created {
            store.init().await?;
        }
        Ok(store)
    }

    /// Write the initial state of an empty repository: `HEAD` pointing at
    /// `refs/heads/master` and the default config.
    pub async fn init(&self) -> DocResult<()> {
        let head = Reference::new_symbolic(
            ReferenceName::head(),
            ReferenceName::branch(DEFAULT_BRANCH),
        );
        self.refs.set_reference(&head).await?;
        self.meta.set_config(&RepoConfig::default()).await?;
        info!(database = %self.gateway.config().database, "initialized repository");
        Ok(())
    }

    pub fn gateway(&self) -> &Gateway {
        &self.gateway
    }

    pub fn objects(&self) -> &DocumentObjectStore {
        &self.objects
    }

    pub fn refs(&self) -> &DocumentRefStore {
        &self.refs
    }

    pub fn meta(&self) -> &DocumentMetaStore {
        &self.meta
    }
}

#[async_trait]
impl ObjectStore for DocStore {
    async fn set_encoded_object(&self, object: &EncodedObject) -> StoreResult<ObjectHash> {
        self.objects.set_encoded_object(object).await
    }

    async fn encoded_object(&self, kind: ObjectType, hash: ObjectHash) -> StoreResult<EncodedObject> {
        self.objects.encoded_object(kind, hash).await
    }

    async fn has_encoded_object(&self, hash: ObjectHash) -> StoreResult<()> {
        self.objects.has_encoded_object(hash).await
    }

    async fn encoded_object_size(&self, hash: ObjectHash) -> StoreResult<u64> {
        self.objects.encoded_object_size(hash).await
    }

    async fn iter_encoded_objects(&self, kind: ObjectType) -> StoreResult<ObjectIter> {
        self.objects.iter_encoded_objects(kind).await
    }
}

#[async_trait]
impl RefStore for DocStore {
    async fn set_reference(&self, reference: &Reference) -> docgit_refs::Result<()> {
        self.refs.set_reference(reference).await
    }

    async fn check_and_set_reference(
        &self,
        new: Option<&Reference>,
        old: Option<&Reference>,
    ) -> docgit_refs::Result<()> {
        self.refs.check_and_set_reference(new, old).await
    }

    async fn reference(&self, name: &ReferenceName) -> docgit_refs::Result<Reference> {
        self.refs.reference(name).await
    }

    async fn iter_references(&self) -> docgit_refs::Result<RefIter> {
        self.refs.iter_references().await
    }

    async fn remove_reference(&self, name: &ReferenceName) -> docgit_refs::Result<()> {
        self.refs.remove_reference(name).await
    }

    async fn count_loose_refs(&self) -> docgit_refs::Result<u64> {
        self.refs.count_loose_refs().await
    }

    async fn pack_refs(&self) -> docgit_refs::Result<()> {
        self.refs.pack_refs().await
    }
}

#[async_trait]
impl MetaStore for DocStore {
    async fn set_shallow(&self, commits: &[ObjectHash]) -> MetaResult<()> {
        self.meta.set_shallow(commits).await
    }

    async fn shallow(&self) -> MetaResult<Vec<ObjectHash>> {
        self.meta.shallow().await
    }

    async fn set_index(&self, index: &Index) -> MetaResult<()> {
        self.meta.set_index(index).await
    }

    async fn index(&self) -> MetaResult<Index> {
        self.meta.index().await
    }

    async fn set_config(&self, config: &RepoConfig) -> MetaResult<()> {
        self.meta.set_config(config).await
    }

    async fn config(&self) -> MetaResult<RepoConfig> {
        self.meta.config().await
    }
}

#[async_trait]
impl Storer for DocStore {
    async fn module(&self, name: &str) -> DocResult<Option<Arc<dyn Storer>>> {
        debug!(module = name, "submodule storage is not supported");
        Ok(None)
    }
}
