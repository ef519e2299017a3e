use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use docgit_gateway::{str_field, Collection, Document, DocumentIter, Filter, Unique};
use docgit_types::{EncodedObject, ObjectHash, ObjectType};
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{StoreError, StoreResult};
use crate::traits::ObjectStore;

const HASH_FIELD: &str = "hash";
const TYPE_FIELD: &str = "type";
const OBJECT_FIELD: &str = "object";

/// Iterator over stored objects.
pub type ObjectIter = DocumentIter<EncodedObject, StoreError>;

/// [`ObjectStore`] backed by a document collection.
#[derive(Clone, Debug)]
pub struct DocumentObjectStore {
    objects: Collection,
}

impl DocumentObjectStore {
    pub fn new(objects: Collection) -> Self {
        Self { objects }
    }

    pub fn collection(&self) -> &Collection {
        &self.objects
    }

    async fn read_one(&self, hash: ObjectHash, filter: Filter) -> StoreResult<EncodedObject> {
        match self.objects.find_unique(filter).await? {
            Unique::Found(doc) => decode_object(doc),
            Unique::Missing => Err(StoreError::NotFound(hash)),
            Unique::Duplicated(count) => {
                warn!(%hash, count, "object key is not unique");
                Err(StoreError::TooManyResults { count })
            }
        }
    }
}

fn by_hash(hash: ObjectHash) -> Filter {
    Filter::all().eq(HASH_FIELD, hash.to_hex())
}

/// Rebuild an object from its stored document, keeping the stored hash.
fn decode_object(doc: Document) -> StoreResult<EncodedObject> {
    let hash = ObjectHash::from_hex(str_field(&doc, HASH_FIELD)?)?;
    let kind: ObjectType = str_field(&doc, TYPE_FIELD)?.parse()?;
    let data = match doc.get(OBJECT_FIELD) {
        Some(Value::String(encoded)) => STANDARD.decode(encoded)?,
        // An empty payload may be stored as null or left out.
        None | Some(Value::Null) => Vec::new(),
        Some(other) => {
            return Err(StoreError::InvalidDocument(format!(
                "object payload of {hash} is not a string: {other}"
            )))
        }
    };
    Ok(EncodedObject::new(kind, data).with_hash(hash))
}

#[async_trait]
impl ObjectStore for DocumentObjectStore {
    async fn set_encoded_object(&self, object: &EncodedObject) -> StoreResult<ObjectHash> {
        let kind = object.kind();
        if !kind.is_storable() {
            return Err(StoreError::InvalidType(kind));
        }
        let hash = object.hash();
        let key = by_hash(hash).eq(TYPE_FIELD, kind.as_str());
        let mut fields = Document::new();
        fields.insert(OBJECT_FIELD.into(), Value::String(STANDARD.encode(object.data())));
        self.objects.upsert(key, fields).await?;
        debug!(%hash, %kind, size = object.size(), "stored object");
        Ok(hash)
    }

    async fn encoded_object(&self, kind: ObjectType, hash: ObjectHash) -> StoreResult<EncodedObject> {
        let filter = match kind {
            ObjectType::Any => by_hash(hash),
            kind => by_hash(hash).eq(TYPE_FIELD, kind.as_str()),
        };
        self.read_one(hash, filter).await
    }

    async fn has_encoded_object(&self, hash: ObjectHash) -> StoreResult<()> {
        match self.objects.find_first(by_hash(hash)).await? {
            Some(_) => Ok(()),
            None => Err(StoreError::NotFound(hash)),
        }
    }

    async fn encoded_object_size(&self, hash: ObjectHash) -> StoreResult<u64> {
        match self.objects.find_first(by_hash(hash)).await? {
            Some(doc) => Ok(decode_object(doc)?.size()),
            None => Ok(0),
        }
    }

    async fn iter_encoded_objects(&self, kind: ObjectType) -> StoreResult<ObjectIter> {
        if !matches!(kind, ObjectType::Blob | ObjectType::Commit | ObjectType::Tag) {
            return Ok(ObjectIter::empty());
        }
        let filter = Filter::all().eq(TYPE_FIELD, kind.as_str());
        let cursor = self.objects.find(filter, false).await?;
        Ok(ObjectIter::new(cursor, decode_object))
    }
}
