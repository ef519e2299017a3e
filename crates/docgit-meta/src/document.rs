use async_trait::async_trait;
use docgit_gateway::{Collection, Document, Filter, GatewayError};
use docgit_types::ObjectHash;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::error::{MetaError, MetaResult};
use crate::traits::MetaStore;
use crate::types::{Index, RepoConfig};

const KEY_FIELD: &str = "_key";

/// A well-known document in the `misc` collection.
#[derive(Clone, Copy, Debug)]
struct Slot {
    key: &'static str,
    field: &'static str,
}

const SHALLOW: Slot = Slot {
    key: "shallow-key",
    field: "shallow",
};
const INDEX: Slot = Slot {
    key: "index-key",
    field: "idx",
};
const CONFIG: Slot = Slot {
    key: "config-key",
    field: "config",
};

/// [`MetaStore`] keeping each slot as one document in a collection.
#[derive(Clone, Debug)]
pub struct DocumentMetaStore {
    misc: Collection,
}

impl DocumentMetaStore {
    pub fn new(misc: Collection) -> Self {
        Self { misc }
    }

    pub fn collection(&self) -> &Collection {
        &self.misc
    }

    async fn write<T: Serialize + ?Sized + Sync>(&self, slot: Slot, value: &T) -> MetaResult<()> {
        let encoded = serde_json::to_string(value)?;
        let mut fields = Document::new();
        fields.insert(slot.field.into(), Value::String(encoded));
        self.misc
            .upsert(Filter::all().eq(KEY_FIELD, slot.key), fields)
            .await?;
        debug!(slot = slot.key, "wrote metadata");
        Ok(())
    }

    async fn read<T: DeserializeOwned + Default>(&self, slot: Slot) -> MetaResult<T> {
        let doc = match self.misc.read_document(slot.key).await {
            Ok(doc) => doc,
            Err(GatewayError::NotFound(_)) => {
                debug!(slot = slot.key, "metadata not written yet");
                return Ok(T::default());
            }
            Err(e) => return Err(e.into()),
        };
        match doc.get(slot.field) {
            Some(Value::String(encoded)) => Ok(serde_json::from_str(encoded)?),
            Some(other) => Err(MetaError::Serialization(format!(
                "{} payload is not a string: {other}",
                slot.key
            ))),
            None => Err(MetaError::Serialization(format!(
                "{} has no {} field",
                slot.key, slot.field
            ))),
        }
    }
}

#[async_trait]
impl MetaStore for DocumentMetaStore {
    async fn set_shallow(&self, commits: &[ObjectHash]) -> MetaResult<()> {
        self.write(SHALLOW, commits).await
    }

    async fn shallow(&self) -> MetaResult<Vec<ObjectHash>> {
        self.read(SHALLOW).await
    }

    async fn set_index(&self, index: &Index) -> MetaResult<()> {
        self.write(INDEX, index).await
    }

    async fn index(&self) -> MetaResult<Index> {
        self.read(INDEX).await
    }

    async fn set_config(&self, config: &RepoConfig) -> MetaResult<()> {
        self.write(CONFIG, config).await
    }

    async fn config(&self) -> MetaResult<RepoConfig> {
        self.read(CONFIG).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::IndexEntry;
    use docgit_gateway::{Database, InMemoryDatabase, MISC_COLLECTION};
    use serde_json::json;
    use std::sync::Arc;

    async fn store() -> (Arc<InMemoryDatabase>, DocumentMetaStore) {
        let db = Arc::new(InMemoryDatabase::new("test"));
        db.create_collection(MISC_COLLECTION).await.unwrap();
        let coll = Collection::new(Arc::clone(&db) as Arc<dyn Database>, MISC_COLLECTION);
        (db, DocumentMetaStore::new(coll))
    }

    #[tokio::test]
    async fn empty_slots_read_as_defaults() {
        let (_, store) = store().await;
        assert!(store.shallow().await.unwrap().is_empty());
        assert_eq!(store.index().await.unwrap(), Index::default());
        assert_eq!(store.config().await.unwrap(), RepoConfig::default());
    }

    #[tokio::test]
    async fn shallow_round_trip_under_its_own_key() {
        let (db, store) = store().await;
        let commits = vec![ObjectHash::digest(b"c1"), ObjectHash::digest(b"c2")];
        store.set_shallow(&commits).await.unwrap();
        assert_eq!(store.shallow().await.unwrap(), commits);

        let doc = db.read_document(MISC_COLLECTION, "shallow-key").await.unwrap();
        assert!(doc.contains_key("shallow"));
        // The index slot is untouched.
        assert_eq!(store.index().await.unwrap(), Index::default());
    }

    #[tokio::test]
    async fn index_round_trip() {
        let (_, store) = store().await;
        let mut index = Index::default();
        index.add(IndexEntry::new("README.md", ObjectHash::digest(b"r"), 0o100644, 12));
        store.set_index(&index).await.unwrap();
        assert_eq!(store.index().await.unwrap(), index);
    }

    #[tokio::test]
    async fn config_overwrites_in_place() {
        let (db, store) = store().await;
        let mut config = RepoConfig::default();
        store.set_config(&config).await.unwrap();
        config.add_remote("origin", "https://example.com/repo.git");
        store.set_config(&config).await.unwrap();

        assert_eq!(store.config().await.unwrap(), config);
        assert_eq!(db.document_count(MISC_COLLECTION), 1);
    }

    #[tokio::test]
    async fn slots_are_independent() {
        let (db, store) = store().await;
        store.set_shallow(&[ObjectHash::digest(b"s")]).await.unwrap();
        store.set_index(&Index::default()).await.unwrap();
        store.set_config(&RepoConfig::default()).await.unwrap();
        assert_eq!(db.document_count(MISC_COLLECTION), 3);
        assert_eq!(store.shallow().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn corrupt_payload_is_a_serialization_error() {
        let (db, store) = store().await;
        let doc = json!({ "_key": "config-key", "config": "{ not json" });
        db.insert_raw(MISC_COLLECTION, doc.as_object().cloned().unwrap())
            .unwrap();
        assert!(matches!(
            store.config().await,
            Err(MetaError::Serialization(_))
        ));
    }

    #[tokio::test]
    async fn malformed_slot_documents_are_not_defaults() {
        let (db, store) = store().await;
        let missing = json!({ "_key": "index-key", "other": "x" });
        db.insert_raw(MISC_COLLECTION, missing.as_object().cloned().unwrap())
            .unwrap();
        assert!(matches!(
            store.index().await,
            Err(MetaError::Serialization(_))
        ));

        let wrong_type = json!({ "_key": "shallow-key", "shallow": 7 });
        db.insert_raw(MISC_COLLECTION, wrong_type.as_object().cloned().unwrap())
            .unwrap();
        assert!(matches!(
            store.shallow().await,
            Err(MetaError::Serialization(_))
        ));
    }

    #[tokio::test]
    async fn transport_errors_are_not_defaults() {
        let (db, store) = store().await;
        db.set_unavailable(true);
        assert!(matches!(store.index().await, Err(MetaError::Gateway(_))));
    }
}
