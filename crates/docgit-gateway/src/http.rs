//! ArangoDB driver over its HTTP API.
//!
//! Endpoints used:
//!
//! - `GET  /_db/{db}/_api/database/current`: database existence
//! - `POST /_api/database`: create database
//! - `GET  /_db/{db}/_api/collection/{name}`: collection existence
//! - `POST /_db/{db}/_api/collection`: create collection
//! - `POST /_db/{db}/_api/cursor`: run AQL, first batch
//! - `PUT  /_db/{db}/_api/cursor/{id}`: next batch
//! - `DELETE /_db/{db}/_api/cursor/{id}`: release cursor
//! - `GET  /_db/{db}/_api/document/{collection}/{key}`: read by key

use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::config::{BasicAuth, GatewayConfig};
use crate::document::Document;
use crate::error::{GatewayError, GatewayResult};
use crate::query::{Query, QueryOptions};
use crate::traits::{Cursor, Database, DocumentClient};

const ERROR_DOCUMENT_NOT_FOUND: i64 = 1202;
const ERROR_COLLECTION_NOT_FOUND: i64 = 1203;
const ERROR_DUPLICATE_NAME: i64 = 1207;
const ERROR_DATABASE_NOT_FOUND: i64 = 1228;
const ERROR_CURSOR_NOT_FOUND: i64 = 1600;

#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default, rename = "errorNum")]
    error_num: i64,
    #[serde(default, rename = "errorMessage")]
    error_message: String,
}

#[derive(Debug, Deserialize)]
struct CursorBatch {
    #[serde(default)]
    result: Vec<Document>,
    #[serde(default, rename = "hasMore")]
    has_more: bool,
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    count: Option<u64>,
}

fn map_error(status: u16, body: ErrorBody) -> GatewayError {
    match body.error_num {
        ERROR_DOCUMENT_NOT_FOUND
        | ERROR_COLLECTION_NOT_FOUND
        | ERROR_DATABASE_NOT_FOUND
        | ERROR_CURSOR_NOT_FOUND => GatewayError::NotFound(body.error_message),
        ERROR_DUPLICATE_NAME => GatewayError::AlreadyExists(body.error_message),
        _ if status == 404 => GatewayError::NotFound(body.error_message),
        code => GatewayError::Server {
            status,
            code,
            message: body.error_message,
        },
    }
}

/// Shared HTTP state: pooled client, base URL and credentials.
struct Endpoint {
    http: reqwest::Client,
    base: String,
    auth: Option<BasicAuth>,
}

impl Endpoint {
    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let req = self.http.request(method, format!("{}{path}", self.base));
        match &self.auth {
            Some(auth) => req.basic_auth(&auth.username, Some(&auth.password)),
            None => req,
        }
    }

    async fn send(&self, req: RequestBuilder) -> GatewayResult<Value> {
        let resp = req.send().await?;
        let status = resp.status();
        let body = resp.bytes().await?;
        if status.is_success() {
            if body.is_empty() {
                return Ok(Value::Null);
            }
            return Ok(serde_json::from_slice(&body)?);
        }
        let err: ErrorBody = serde_json::from_slice(&body).unwrap_or_default();
        Err(map_error(status.as_u16(), err))
    }

    async fn delete_cursor(&self, db: &str, id: &str) -> GatewayResult<()> {
        let req = self.request(Method::DELETE, &format!("/_db/{db}/_api/cursor/{id}"));
        match self.send(req).await {
            // Already exhausted or expired on the server.
            Err(GatewayError::NotFound(_)) => Ok(()),
            other => other.map(|_| ()),
        }
    }
}

/// [`DocumentClient`] speaking the ArangoDB HTTP API.
#[derive(Clone)]
pub struct HttpClient {
    endpoint: Arc<Endpoint>,
}

impl HttpClient {
    /// Build a client from configuration. No request is made yet.
    ///
    /// Requests go to the first configured endpoint. `conn_limit` bounds the
    /// idle connections reqwest keeps pooled for it.
    pub fn new(config: &GatewayConfig) -> GatewayResult<Self> {
        config.validate()?;
        let http = reqwest::Client::builder()
            .pool_max_idle_per_host(config.conn_limit)
            .build()?;
        let base = config.endpoints[0].trim_end_matches('/').to_string();
        Ok(Self {
            endpoint: Arc::new(Endpoint {
                http,
                base,
                auth: config.auth.clone(),
            }),
        })
    }

    fn handle(&self, name: &str) -> Arc<dyn Database> {
        Arc::new(HttpDatabase {
            endpoint: Arc::clone(&self.endpoint),
            name: name.to_string(),
        })
    }
}

impl fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpClient")
            .field("base", &self.endpoint.base)
            .finish()
    }
}

#[async_trait]
impl DocumentClient for HttpClient {
    async fn database_exists(&self, name: &str) -> GatewayResult<bool> {
        let req = self
            .endpoint
            .request(Method::GET, &format!("/_db/{name}/_api/database/current"));
        match self.endpoint.send(req).await {
            Ok(_) => Ok(true),
            Err(GatewayError::NotFound(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    async fn create_database(&self, name: &str) -> GatewayResult<Arc<dyn Database>> {
        let req = self
            .endpoint
            .request(Method::POST, "/_api/database")
            .json(&json!({ "name": name }));
        self.endpoint.send(req).await?;
        Ok(self.handle(name))
    }

    async fn database(&self, name: &str) -> GatewayResult<Arc<dyn Database>> {
        if !self.database_exists(name).await? {
            return Err(GatewayError::NotFound(format!("database {name}")));
        }
        Ok(self.handle(name))
    }
}

struct HttpDatabase {
    endpoint: Arc<Endpoint>,
    name: String,
}

#[async_trait]
impl Database for HttpDatabase {
    fn name(&self) -> &str {
        &self.name
    }

    async fn collection_exists(&self, name: &str) -> GatewayResult<bool> {
        let req = self.endpoint.request(
            Method::GET,
            &format!("/_db/{}/_api/collection/{name}", self.name),
        );
        match self.endpoint.send(req).await {
            Ok(_) => Ok(true),
            Err(GatewayError::NotFound(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    async fn create_collection(&self, name: &str) -> GatewayResult<()> {
        let req = self
            .endpoint
            .request(Method::POST, &format!("/_db/{}/_api/collection", self.name))
            .json(&json!({ "name": name }));
        self.endpoint.send(req).await.map(|_| ())
    }

    async fn query(&self, query: &Query, options: QueryOptions) -> GatewayResult<Box<dyn Cursor>> {
        let (aql, binds) = query.to_aql(&options);
        debug!(db = %self.name, %aql, "query");
        let mut body = json!({
            "query": aql,
            "bindVars": binds,
            "count": options.count,
        });
        if let Some(batch_size) = options.batch_size {
            body["batchSize"] = json!(batch_size);
        }
        let req = self
            .endpoint
            .request(Method::POST, &format!("/_db/{}/_api/cursor", self.name))
            .json(&body);
        let batch: CursorBatch = serde_json::from_value(self.endpoint.send(req).await?)?;
        Ok(Box::new(HttpCursor::new(
            Arc::clone(&self.endpoint),
            self.name.clone(),
            batch,
        )))
    }

    async fn read_document(&self, collection: &str, key: &str) -> GatewayResult<Document> {
        let req = self.endpoint.request(
            Method::GET,
            &format!("/_db/{}/_api/document/{collection}/{key}", self.name),
        );
        match self.endpoint.send(req).await? {
            Value::Object(doc) => Ok(doc),
            other => Err(GatewayError::InvalidDocument(format!(
                "expected object for {collection}/{key}, got {other}"
            ))),
        }
    }
}

/// Cursor buffering one server batch at a time.
struct HttpCursor {
    endpoint: Arc<Endpoint>,
    db: String,
    id: Option<String>,
    buffer: VecDeque<Document>,
    has_more: bool,
    count: Option<u64>,
    closed: bool,
}

impl HttpCursor {
    fn new(endpoint: Arc<Endpoint>, db: String, batch: CursorBatch) -> Self {
        Self {
            endpoint,
            db,
            id: batch.id,
            buffer: batch.result.into(),
            has_more: batch.has_more,
            count: batch.count,
            closed: false,
        }
    }

    /// Whether the server still holds state for this cursor.
    fn holds_server_state(&self) -> bool {
        self.has_more && self.id.is_some()
    }
}

#[async_trait]
impl Cursor for HttpCursor {
    fn count(&self) -> Option<u64> {
        self.count
    }

    async fn read_document(&mut self) -> GatewayResult<Option<Document>> {
        if self.closed {
            return Err(GatewayError::NotFound("cursor already closed".into()));
        }
        loop {
            if let Some(doc) = self.buffer.pop_front() {
                return Ok(Some(doc));
            }
            if !self.has_more {
                return Ok(None);
            }
            let id = self
                .id
                .as_deref()
                .ok_or_else(|| GatewayError::Internal("cursor has more results but no id".into()))?;
            let req = self
                .endpoint
                .request(Method::PUT, &format!("/_db/{}/_api/cursor/{id}", self.db));
            let batch: CursorBatch = serde_json::from_value(self.endpoint.send(req).await?)?;
            self.buffer.extend(batch.result);
            self.has_more = batch.has_more;
        }
    }

    async fn close(&mut self) -> GatewayResult<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.buffer.clear();
        if self.holds_server_state() {
            self.has_more = false;
            if let Some(id) = self.id.take() {
                debug!(db = %self.db, %id, "releasing cursor");
                self.endpoint.delete_cursor(&self.db, &id).await?;
            }
        }
        Ok(())
    }
}

impl Drop for HttpCursor {
    fn drop(&mut self) {
        if self.closed || !self.holds_server_state() {
            return;
        }
        let Some(id) = self.id.take() else { return };
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let endpoint = Arc::clone(&self.endpoint);
                let db = std::mem::take(&mut self.db);
                handle.spawn(async move {
                    if let Err(e) = endpoint.delete_cursor(&db, &id).await {
                        warn!(%db, %id, error = %e, "failed to release dropped cursor");
                    }
                });
            }
            Err(_) => {
                warn!(db = %self.db, %id, "cursor dropped outside a runtime; left for server expiry");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn error(num: i64, message: &str) -> ErrorBody {
        ErrorBody {
            error_num: num,
            error_message: message.into(),
        }
    }

    #[test]
    fn not_found_error_numbers() {
        for num in [1202, 1203, 1228, 1600] {
            assert!(map_error(404, error(num, "gone")).is_not_found());
        }
    }

    #[test]
    fn duplicate_name_is_already_exists() {
        assert!(map_error(409, error(1207, "duplicate name")).is_already_exists());
    }

    #[test]
    fn bare_404_is_not_found() {
        assert!(map_error(404, ErrorBody::default()).is_not_found());
    }

    #[test]
    fn other_errors_keep_status_and_code() {
        match map_error(400, error(1501, "syntax error")) {
            GatewayError::Server {
                status,
                code,
                message,
            } => {
                assert_eq!(status, 400);
                assert_eq!(code, 1501);
                assert_eq!(message, "syntax error");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn parses_cursor_batch() {
        let batch: CursorBatch = serde_json::from_value(json!({
            "result": [{ "name": "HEAD", "target": "ref: refs/heads/master" }],
            "hasMore": true,
            "id": "1234",
            "count": 3,
            "error": false,
            "code": 201
        }))
        .unwrap();
        assert_eq!(batch.result.len(), 1);
        assert!(batch.has_more);
        assert_eq!(batch.id.as_deref(), Some("1234"));
        assert_eq!(batch.count, Some(3));
    }

    #[test]
    fn parses_final_batch_without_id() {
        let batch: CursorBatch =
            serde_json::from_value(json!({ "result": [], "hasMore": false })).unwrap();
        assert!(batch.result.is_empty());
        assert!(batch.id.is_none());
        assert!(batch.count.is_none());
    }

    #[test]
    fn rejects_invalid_config() {
        let mut config = GatewayConfig::default();
        config.endpoints.clear();
        assert!(matches!(HttpClient::new(&config), Err(GatewayError::Config(_))));
    }

    #[tokio::test]
    async fn unreachable_server_is_transport_error() {
        let client = HttpClient::new(&GatewayConfig::new("http://127.0.0.1:1", "docgit")).unwrap();
        let err = client.database_exists("docgit").await.unwrap_err();
        assert!(matches!(err, GatewayError::Transport(_)));
    }

    #[tokio::test]
    async fn exhausted_cursor_closes_without_round_trip() {
        let client = HttpClient::new(&GatewayConfig::new("http://127.0.0.1:1", "docgit")).unwrap();
        let batch: CursorBatch =
            serde_json::from_value(json!({ "result": [{ "a": 1 }], "hasMore": false })).unwrap();
        let mut cursor = HttpCursor::new(Arc::clone(&client.endpoint), "docgit".into(), batch);

        assert!(cursor.read_document().await.unwrap().is_some());
        assert!(cursor.read_document().await.unwrap().is_none());
        // No server state to release, so closing never touches the network.
        cursor.close().await.unwrap();
        cursor.close().await.unwrap();
        assert!(cursor.read_document().await.is_err());
    }

    mod live {
        use super::*;
        use crate::iter::DocumentIter;
        use crate::query::Filter;
        use std::ops::ControlFlow;
        use std::time::Duration;
        use wiremock::matchers::{header, method, path};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        const CURSOR: &str = "/_db/docgit/_api/cursor";

        fn client(server: &MockServer) -> HttpClient {
            HttpClient::new(&GatewayConfig::new(server.uri(), "docgit")).unwrap()
        }

        fn find_all() -> Query {
            Query::Find {
                collection: "refs".into(),
                filter: Filter::all(),
            }
        }

        fn keep(doc: Document) -> GatewayResult<Document> {
            Ok(doc)
        }

        async fn first_batch(server: &MockServer, id: &str, names: &[&str]) {
            let result: Vec<Value> = names.iter().map(|n| json!({ "name": n })).collect();
            Mock::given(method("POST"))
                .and(path(CURSOR))
                .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                    "result": result,
                    "hasMore": true,
                    "id": id,
                    "count": 4,
                    "error": false,
                    "code": 201
                })))
                .mount(server)
                .await;
        }

        async fn expect_release(server: &MockServer, id: &str, times: u64) {
            Mock::given(method("DELETE"))
                .and(path(format!("{CURSOR}/{id}")))
                .respond_with(
                    ResponseTemplate::new(202)
                        .set_body_json(json!({ "id": id, "error": false, "code": 202 })),
                )
                .expect(times)
                .mount(server)
                .await;
        }

        async fn deletes(server: &MockServer) -> usize {
            server
                .received_requests()
                .await
                .unwrap_or_default()
                .iter()
                .filter(|r| r.method.as_str() == "DELETE")
                .count()
        }

        #[tokio::test]
        async fn fetches_second_batch_and_needs_no_release() {
            let server = MockServer::start().await;
            first_batch(&server, "42", &["a", "b"]).await;
            Mock::given(method("PUT"))
                .and(path(format!("{CURSOR}/42")))
                .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                    "result": [{ "name": "c" }, { "name": "d" }],
                    "hasMore": false,
                    "id": "42",
                    "count": 4
                })))
                .expect(1)
                .mount(&server)
                .await;
            expect_release(&server, "42", 0).await;

            let db = client(&server).handle("docgit");
            let cursor = db
                .query(&find_all(), QueryOptions::default().with_count())
                .await
                .unwrap();
            assert_eq!(cursor.count(), Some(4));

            let docs = DocumentIter::new(cursor, keep).collect().await.unwrap();
            let names: Vec<&str> = docs.iter().map(|d| d["name"].as_str().unwrap()).collect();
            assert_eq!(names, vec!["a", "b", "c", "d"]);
            server.verify().await;
        }

        #[tokio::test]
        async fn early_stop_releases_cursor_once() {
            let server = MockServer::start().await;
            first_batch(&server, "7", &["a", "b"]).await;
            expect_release(&server, "7", 1).await;

            let db = client(&server).handle("docgit");
            let cursor = db.query(&find_all(), QueryOptions::default()).await.unwrap();
            let mut seen = 0;
            DocumentIter::new(cursor, keep)
                .for_each(|_| {
                    seen += 1;
                    Ok(ControlFlow::Break(()))
                })
                .await
                .unwrap();
            assert_eq!(seen, 1);
            server.verify().await;
        }

        #[tokio::test]
        async fn dropped_cursor_is_released_in_background() {
            let server = MockServer::start().await;
            first_batch(&server, "9", &["a", "b"]).await;
            expect_release(&server, "9", 1).await;

            let db = client(&server).handle("docgit");
            let mut cursor = db.query(&find_all(), QueryOptions::default()).await.unwrap();
            assert!(cursor.read_document().await.unwrap().is_some());
            drop(cursor);

            for _ in 0..50 {
                if deletes(&server).await > 0 {
                    break;
                }
                tokio::time::sleep(Duration::from_millis(20)).await;
            }
            assert_eq!(deletes(&server).await, 1);
            server.verify().await;
        }

        #[tokio::test]
        async fn sends_basic_auth() {
            let server = MockServer::start().await;
            Mock::given(method("GET"))
                .and(path("/_db/docgit/_api/database/current"))
                .and(header("authorization", "Basic cm9vdDpzZWNyZXQ="))
                .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                    "result": { "name": "docgit" },
                    "error": false,
                    "code": 200
                })))
                .expect(1)
                .mount(&server)
                .await;

            let mut config = GatewayConfig::new(server.uri(), "docgit");
            config.auth = Some(BasicAuth {
                username: "root".into(),
                password: "secret".into(),
            });
            let client = HttpClient::new(&config).unwrap();
            assert!(client.database_exists("docgit").await.unwrap());
            server.verify().await;
        }

        #[tokio::test]
        async fn maps_error_numbers_from_responses() {
            let server = MockServer::start().await;
            Mock::given(method("GET"))
                .and(path("/_db/missing/_api/database/current"))
                .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                    "error": true,
                    "errorNum": 1228,
                    "errorMessage": "database not found",
                    "code": 404
                })))
                .mount(&server)
                .await;
            Mock::given(method("POST"))
                .and(path("/_api/database"))
                .respond_with(ResponseTemplate::new(409).set_body_json(json!({
                    "error": true,
                    "errorNum": 1207,
                    "errorMessage": "duplicate database name",
                    "code": 409
                })))
                .mount(&server)
                .await;
            Mock::given(method("POST"))
                .and(path(CURSOR))
                .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                    "error": true,
                    "errorNum": 1501,
                    "errorMessage": "syntax error",
                    "code": 400
                })))
                .mount(&server)
                .await;

            let client = client(&server);
            assert!(!client.database_exists("missing").await.unwrap());
            assert!(matches!(
                client.create_database("docgit").await,
                Err(GatewayError::AlreadyExists(_))
            ));
            let result = client
                .handle("docgit")
                .query(&find_all(), QueryOptions::default())
                .await;
            assert!(matches!(
                result,
                Err(GatewayError::Server { status: 400, code: 1501, .. })
            ));
        }
    }
}
