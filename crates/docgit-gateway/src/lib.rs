//! Document-store gateway for docgit.
//!
//! Everything docgit persists goes through this crate: it owns the connection
//! to the remote document database, provisions the database and the
//! collections the stores need, runs queries, and streams their results back
//! through server-side cursors.
//!
//! # Drivers
//!
//! All drivers implement [`DocumentClient`] and [`Database`]:
//!
//! - [`HttpClient`]: ArangoDB over its HTTP API
//! - [`InMemoryClient`]: process-local driver for tests and embedding
//!
//! # Design Rules
//!
//! 1. No state is cached locally; every call is a round trip to the driver.
//! 2. Provisioning is idempotent. "Already exists" on create is success.
//! 3. Cursors are released exactly once: explicitly via `close`, or by the
//!    driver when an unclosed cursor is dropped.
//! 4. Driver errors surface unchanged; there is no retry logic here.

pub mod collection;
pub mod config;
pub mod document;
pub mod error;
pub mod gateway;
pub mod http;
pub mod iter;
pub mod memory;
pub mod query;
pub mod traits;

pub use collection::{Collection, Unique};
pub use config::{BasicAuth, GatewayConfig};
pub use document::{str_field, Document};
pub use error::{GatewayError, GatewayResult};
pub use gateway::{
    get_or_create_collection, get_or_create_database, Gateway, MISC_COLLECTION,
    OBJECTS_COLLECTION, REFS_COLLECTION,
};
pub use http::HttpClient;
pub use iter::{Decoder, DocumentIter};
pub use memory::{InMemoryClient, InMemoryDatabase};
pub use query::{Filter, Query, QueryOptions};
pub use traits::{Cursor, Database, DocumentClient};
