//! [`RefStore`] over the `refs` collection.

use async_trait::async_trait;
use docgit_gateway::{str_field, Collection, Document, DocumentIter, Filter, Unique};
use docgit_types::{Reference, ReferenceName};
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{RefError, Result};
use crate::traits::RefStore;

const NAME_FIELD: &str = "name";
const TARGET_FIELD: &str = "target";

/// Iterator over stored references.
pub type RefIter = DocumentIter<Reference, RefError>;

/// Reference store keeping one document per reference name.
#[derive(Clone, Debug)]
pub struct DocumentRefStore {
    refs: Collection,
}

impl DocumentRefStore {
    pub fn new(refs: Collection) -> Self {
        Self { refs }
    }

    pub fn collection(&self) -> &Collection {
        &self.refs
    }
}

fn by_name(name: &str) -> Filter {
    Filter::all().eq(NAME_FIELD, name)
}

fn decode_reference(doc: Document) -> Result<Reference> {
    let name = str_field(&doc, NAME_FIELD)?;
    let target = str_field(&doc, TARGET_FIELD)?;
    Ok(Reference::from_strings(name, target)?)
}

#[async_trait]
impl RefStore for DocumentRefStore {
    async fn set_reference(&self, reference: &Reference) -> Result<()> {
        let [name, target] = reference.strings();
        let mut fields = Document::new();
        fields.insert(TARGET_FIELD.into(), Value::String(target));
        self.refs.upsert(by_name(&name), fields).await?;
        debug!(%reference, "set reference");
        Ok(())
    }

    async fn check_and_set_reference(
        &self,
        new: Option<&Reference>,
        old: Option<&Reference>,
    ) -> Result<()> {
        let Some(new) = new else {
            return Ok(());
        };
        if let Some(old) = old {
            let current = self.reference(old.name()).await?;
            if current.hash() != old.hash() {
                warn!(
                    name = %old.name(),
                    expected = %old.hash(),
                    found = %current.hash(),
                    "reference has changed"
                );
                return Err(RefError::ReferenceHasChanged {
                    name: old.name().to_string(),
                });
            }
        }
        self.set_reference(new).await
    }

    async fn reference(&self, name: &ReferenceName) -> Result<Reference> {
        match self.refs.find_unique(by_name(name.as_str())).await? {
            Unique::Found(doc) => decode_reference(doc),
            Unique::Missing => Err(RefError::NotFound {
                name: name.to_string(),
            }),
            Unique::Duplicated(count) => {
                warn!(%name, count, "reference name is not unique");
                Err(RefError::TooManyResults {
                    name: name.to_string(),
                    count,
                })
            }
        }
    }

    async fn iter_references(&self) -> Result<RefIter> {
        let cursor = self.refs.find(Filter::all(), false).await?;
        Ok(RefIter::new(cursor, decode_reference))
    }

    async fn remove_reference(&self, name: &ReferenceName) -> Result<()> {
        self.refs.remove(by_name(name.as_str())).await?;
        debug!(%name, "removed reference");
        Ok(())
    }

    async fn count_loose_refs(&self) -> Result<u64> {
        let mut cursor = self.refs.find(Filter::all(), true).await?;
        let counted = match cursor.count() {
            Some(n) => Ok(n),
            None => {
                let mut n = 0;
                loop {
                    match cursor.read_document().await {
                        Ok(Some(_)) => n += 1,
                        Ok(None) => break Ok(n),
                        Err(e) => break Err(e),
                    }
                }
            }
        };
        let closed = cursor.close().await;
        let n = counted?;
        closed?;
        Ok(n)
    }
}
