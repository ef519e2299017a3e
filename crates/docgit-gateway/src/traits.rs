//! Driver seams: client, database and cursor.
//!
//! Any backend (HTTP, in-memory) implements these traits. The stores above
//! only ever talk to `dyn Database` and `dyn Cursor`.

use std::sync::Arc;

use async_trait::async_trait;

use crate::document::Document;
use crate::error::GatewayResult;
use crate::query::{Query, QueryOptions};

/// A connection to a document-database server.
///
/// One client is shared by every store opened from it and must be safe for
/// concurrent use.
#[async_trait]
pub trait DocumentClient: Send + Sync {
    async fn database_exists(&self, name: &str) -> GatewayResult<bool>;

    /// Create a database. Fails with `AlreadyExists` if it is already there.
    async fn create_database(&self, name: &str) -> GatewayResult<Arc<dyn Database>>;

    /// Open an existing database. Fails with `NotFound` if it is absent.
    async fn database(&self, name: &str) -> GatewayResult<Arc<dyn Database>>;
}

/// One database on the server.
#[async_trait]
pub trait Database: Send + Sync {
    fn name(&self) -> &str;

    async fn collection_exists(&self, name: &str) -> GatewayResult<bool>;

    /// Create a collection. Fails with `AlreadyExists` if it is already there.
    async fn create_collection(&self, name: &str) -> GatewayResult<()>;

    /// Run a query and return a cursor over its results.
    ///
    /// Modification queries return an empty cursor.
    async fn query(&self, query: &Query, options: QueryOptions) -> GatewayResult<Box<dyn Cursor>>;

    /// Fetch a single document by its `_key`.
    async fn read_document(&self, collection: &str, key: &str) -> GatewayResult<Document>;
}

/// Server-side enumeration state for one query.
///
/// A cursor is owned by the caller that ran the query and is not shared.
/// `close` releases the server-side resources and is idempotent. A cursor
/// dropped without `close` is released by its driver.
#[async_trait]
pub trait Cursor: Send {
    /// Total number of results, if the query asked for a count.
    fn count(&self) -> Option<u64>;

    /// Fetch the next document. `Ok(None)` once the results are exhausted.
    async fn read_document(&mut self) -> GatewayResult<Option<Document>>;

    async fn close(&mut self) -> GatewayResult<()>;
}
