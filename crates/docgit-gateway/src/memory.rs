//! In-memory document driver for tests and embedding.
//!
//! [`InMemoryClient`] evaluates the same [`Query`] shapes the HTTP driver
//! renders to AQL, against `Vec<Document>` collections behind `RwLock`s. It
//! also exposes the hooks tests need to observe driver behavior: the number
//! of cursors still open, raw inserts that bypass upsert, and a switch that
//! makes every call fail as if the server were unreachable.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use serde_json::Value;

use crate::document::Document;
use crate::error::{GatewayError, GatewayResult};
use crate::query::{Query, QueryOptions};
use crate::traits::{Cursor, Database, DocumentClient};

fn poisoned<E: std::fmt::Display>(e: E) -> GatewayError {
    GatewayError::Internal(format!("lock poisoned: {e}"))
}

fn check_available(flag: &AtomicBool) -> GatewayResult<()> {
    if flag.load(Ordering::SeqCst) {
        return Err(GatewayError::Transport("connection refused".into()));
    }
    Ok(())
}

/// An in-memory implementation of [`DocumentClient`].
///
/// Data is lost when the client is dropped.
#[derive(Debug, Default)]
pub struct InMemoryClient {
    databases: RwLock<HashMap<String, Arc<InMemoryDatabase>>>,
    unavailable: Arc<AtomicBool>,
}

impl InMemoryClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Concrete handle to a database, for inspection in tests.
    pub fn handle(&self, name: &str) -> Option<Arc<InMemoryDatabase>> {
        self.databases.read().ok()?.get(name).cloned()
    }

    /// Make every call on this client and its databases fail with a
    /// transport error (or succeed again).
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }
}

#[async_trait]
impl DocumentClient for InMemoryClient {
    async fn database_exists(&self, name: &str) -> GatewayResult<bool> {
        check_available(&self.unavailable)?;
        let dbs = self.databases.read().map_err(poisoned)?;
        Ok(dbs.contains_key(name))
    }

    async fn create_database(&self, name: &str) -> GatewayResult<Arc<dyn Database>> {
        check_available(&self.unavailable)?;
        let mut dbs = self.databases.write().map_err(poisoned)?;
        if dbs.contains_key(name) {
            return Err(GatewayError::AlreadyExists(format!("database {name}")));
        }
        let db = Arc::new(InMemoryDatabase::with_flag(name, Arc::clone(&self.unavailable)));
        dbs.insert(name.to_string(), Arc::clone(&db));
        Ok(db)
    }

    async fn database(&self, name: &str) -> GatewayResult<Arc<dyn Database>> {
        check_available(&self.unavailable)?;
        let dbs = self.databases.read().map_err(poisoned)?;
        match dbs.get(name) {
            Some(db) => Ok(Arc::clone(db) as Arc<dyn Database>),
            None => Err(GatewayError::NotFound(format!("database {name}"))),
        }
    }
}

/// One in-memory database: named collections of documents.
#[derive(Debug)]
pub struct InMemoryDatabase {
    name: String,
    collections: RwLock<HashMap<String, Vec<Document>>>,
    next_key: AtomicU64,
    open_cursors: Arc<AtomicUsize>,
    unavailable: Arc<AtomicBool>,
}

impl InMemoryDatabase {
    /// A standalone database, not attached to any client.
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_flag(name, Arc::new(AtomicBool::new(false)))
    }

    fn with_flag(name: impl Into<String>, unavailable: Arc<AtomicBool>) -> Self {
        Self {
            name: name.into(),
            collections: RwLock::new(HashMap::new()),
            next_key: AtomicU64::new(1),
            open_cursors: Arc::new(AtomicUsize::new(0)),
            unavailable,
        }
    }

    /// Number of cursors handed out and not yet released.
    pub fn open_cursors(&self) -> usize {
        self.open_cursors.load(Ordering::SeqCst)
    }

    /// Number of documents in a collection (0 if it does not exist).
    pub fn document_count(&self, collection: &str) -> usize {
        self.collections
            .read()
            .map(|c| c.get(collection).map_or(0, Vec::len))
            .unwrap_or(0)
    }

    /// Insert a document as-is, bypassing upsert semantics.
    ///
    /// Lets tests reproduce duplicate keys that only application discipline
    /// would otherwise prevent.
    pub fn insert_raw(&self, collection: &str, mut doc: Document) -> GatewayResult<()> {
        let mut colls = self.collections.write().map_err(poisoned)?;
        let docs = colls
            .get_mut(collection)
            .ok_or_else(|| GatewayError::NotFound(format!("collection {collection}")))?;
        self.assign_key(&mut doc);
        docs.push(doc);
        Ok(())
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn assign_key(&self, doc: &mut Document) {
        if !doc.contains_key("_key") {
            let key = self.next_key.fetch_add(1, Ordering::SeqCst);
            doc.insert("_key".into(), Value::String(key.to_string()));
        }
    }

    fn cursor(&self, docs: Vec<Document>, options: QueryOptions) -> Box<dyn Cursor> {
        self.open_cursors.fetch_add(1, Ordering::SeqCst);
        let count = options.count.then_some(docs.len() as u64);
        Box::new(InMemoryCursor {
            docs: docs.into(),
            count,
            open: Some(Arc::clone(&self.open_cursors)),
            unavailable: Arc::clone(&self.unavailable),
        })
    }

    fn evaluate(&self, query: &Query) -> GatewayResult<Vec<Document>> {
        let mut colls = self.collections.write().map_err(poisoned)?;
        let collection = query.collection();
        let docs = colls
            .get_mut(collection)
            .ok_or_else(|| GatewayError::NotFound(format!("collection {collection}")))?;

        match query {
            Query::Find { filter, .. } => Ok(docs
                .iter()
                .filter(|d| filter.matches(d))
                .cloned()
                .collect()),
            Query::Upsert { key, fields, .. } => {
                if let Some(existing) = docs.iter_mut().find(|d| key.matches(d)) {
                    existing.extend(fields.clone());
                } else {
                    let mut doc: Document = key.conditions().iter().cloned().collect();
                    doc.extend(fields.clone());
                    self.assign_key(&mut doc);
                    docs.push(doc);
                }
                Ok(Vec::new())
            }
            Query::Remove { filter, .. } => {
                docs.retain(|d| !filter.matches(d));
                Ok(Vec::new())
            }
        }
    }
}

#[async_trait]
impl Database for InMemoryDatabase {
    fn name(&self) -> &str {
        &self.name
    }

    async fn collection_exists(&self, name: &str) -> GatewayResult<bool> {
        check_available(&self.unavailable)?;
        let colls = self.collections.read().map_err(poisoned)?;
        Ok(colls.contains_key(name))
    }

    async fn create_collection(&self, name: &str) -> GatewayResult<()> {
        check_available(&self.unavailable)?;
        let mut colls = self.collections.write().map_err(poisoned)?;
        if colls.contains_key(name) {
            return Err(GatewayError::AlreadyExists(format!("collection {name}")));
        }
        colls.insert(name.to_string(), Vec::new());
        Ok(())
    }

    async fn query(&self, query: &Query, options: QueryOptions) -> GatewayResult<Box<dyn Cursor>> {
        check_available(&self.unavailable)?;
        let docs = self.evaluate(query)?;
        Ok(self.cursor(docs, options))
    }

    async fn read_document(&self, collection: &str, key: &str) -> GatewayResult<Document> {
        check_available(&self.unavailable)?;
        let colls = self.collections.read().map_err(poisoned)?;
        let docs = colls
            .get(collection)
            .ok_or_else(|| GatewayError::NotFound(format!("collection {collection}")))?;
        docs.iter()
            .find(|d| d.get("_key").and_then(Value::as_str) == Some(key))
            .cloned()
            .ok_or_else(|| GatewayError::NotFound(format!("document {collection}/{key}")))
    }
}

/// Cursor over a snapshot of matching documents.
struct InMemoryCursor {
    docs: VecDeque<Document>,
    count: Option<u64>,
    /// Shared open-cursor counter; `None` once released.
    open: Option<Arc<AtomicUsize>>,
    unavailable: Arc<AtomicBool>,
}

impl InMemoryCursor {
    fn release(&mut self) {
        if let Some(open) = self.open.take() {
            open.fetch_sub(1, Ordering::SeqCst);
        }
    }
}

#[async_trait]
impl Cursor for InMemoryCursor {
    fn count(&self) -> Option<u64> {
        self.count
    }

    async fn read_document(&mut self) -> GatewayResult<Option<Document>> {
        if self.open.is_none() {
            return Err(GatewayError::NotFound("cursor already closed".into()));
        }
        check_available(&self.unavailable)?;
        Ok(self.docs.pop_front())
    }

    async fn close(&mut self) -> GatewayResult<()> {
        self.release();
        Ok(())
    }
}

impl Drop for InMemoryCursor {
    fn drop(&mut self) {
        self.release();
    }
}
