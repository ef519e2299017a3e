//! A provisioned collection together with the options its queries run with.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::document::Document;
use crate::error::GatewayResult;
use crate::query::{Filter, Query, QueryOptions};
use crate::traits::{Cursor, Database};

/// Outcome of looking up a document that is supposed to be unique.
#[derive(Clone, Debug, PartialEq)]
pub enum Unique {
    Missing,
    Found(Document),
    /// More than one document matched; carries the match count.
    Duplicated(u64),
}

/// Handle to one named collection in a database.
///
/// Cheap to clone; all clones share the underlying connection.
#[derive(Clone)]
pub struct Collection {
    db: Arc<dyn Database>,
    name: String,
    read_options: QueryOptions,
    write_options: QueryOptions,
}

impl Collection {
    pub fn new(db: Arc<dyn Database>, name: impl Into<String>) -> Self {
        Self {
            db,
            name: name.into(),
            read_options: QueryOptions::default(),
            write_options: QueryOptions::default(),
        }
    }

    /// Use these options for reads and writes respectively.
    pub fn with_options(mut self, read: QueryOptions, write: QueryOptions) -> Self {
        self.read_options = read;
        self.write_options = write;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn database(&self) -> &Arc<dyn Database> {
        &self.db
    }

    /// Open a cursor over the documents matching `filter`.
    ///
    /// With `count` set the cursor reports the total number of matches.
    pub async fn find(&self, filter: Filter, count: bool) -> GatewayResult<Box<dyn Cursor>> {
        let query = Query::Find {
            collection: self.name.clone(),
            filter,
        };
        let mut options = self.read_options;
        options.count = count;
        debug!(collection = %self.name, ?query, "find");
        self.db.query(&query, options).await
    }

    /// Look up the single document matching `filter`.
    ///
    /// The query asks for a count, so a uniqueness violation is reported as
    /// [`Unique::Duplicated`] without reading any document. A driver that
    /// cannot count has the remaining matches drained and counted instead.
    /// The cursor is closed before returning.
    pub async fn find_unique(&self, filter: Filter) -> GatewayResult<Unique> {
        let mut cursor = self.find(filter, true).await?;
        let looked_up = match cursor.count() {
            Some(n) if n > 1 => Ok(Unique::Duplicated(n)),
            Some(_) => cursor
                .read_document()
                .await
                .map(|doc| doc.map_or(Unique::Missing, Unique::Found)),
            None => read_uncounted(cursor.as_mut()).await,
        };
        self.finish(cursor, looked_up).await
    }

    /// The first document matching `filter`, if any. Further matches are
    /// ignored and the cursor is closed before returning.
    pub async fn find_first(&self, filter: Filter) -> GatewayResult<Option<Document>> {
        let mut cursor = self.find(filter, false).await?;
        let first = cursor.read_document().await;
        self.finish(cursor, first).await
    }

    /// Insert-or-update the document identified by `key`.
    pub async fn upsert(&self, key: Filter, fields: Document) -> GatewayResult<()> {
        let query = Query::Upsert {
            collection: self.name.clone(),
            key,
            fields,
        };
        debug!(collection = %self.name, "upsert");
        self.execute(&query).await
    }

    /// Delete every document matching `filter`. Matching nothing is not an error.
    pub async fn remove(&self, filter: Filter) -> GatewayResult<()> {
        let query = Query::Remove {
            collection: self.name.clone(),
            filter,
        };
        debug!(collection = %self.name, ?query, "remove");
        self.execute(&query).await
    }

    /// Fetch one document by `_key`.
    pub async fn read_document(&self, key: &str) -> GatewayResult<Document> {
        self.db.read_document(&self.name, key).await
    }

    /// Close `cursor`, keeping the lookup error over a close failure.
    async fn finish<T>(
        &self,
        mut cursor: Box<dyn Cursor>,
        looked_up: GatewayResult<T>,
    ) -> GatewayResult<T> {
        let closed = cursor.close().await;
        match (looked_up, closed) {
            (Err(e), Err(close_err)) => {
                warn!(collection = %self.name, error = %close_err, "failed to close cursor");
                Err(e)
            }
            (Err(e), Ok(())) => Err(e),
            (Ok(found), closed) => closed.map(|()| found),
        }
    }

    async fn execute(&self, query: &Query) -> GatewayResult<()> {
        let mut cursor = self.db.query(query, self.write_options).await?;
        cursor.close().await
    }
}

async fn read_uncounted(cursor: &mut dyn Cursor) -> GatewayResult<Unique> {
    let Some(doc) = cursor.read_document().await? else {
        return Ok(Unique::Missing);
    };
    let mut count = 1;
    while cursor.read_document().await?.is_some() {
        count += 1;
    }
    Ok(if count > 1 {
        Unique::Duplicated(count)
    } else {
        Unique::Found(doc)
    })
}

impl fmt::Debug for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Collection")
            .field("database", &self.db.name())
            .field("name", &self.name)
            .finish()
    }
}
