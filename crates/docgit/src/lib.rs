//! Git repository storage on a document database.
//!
//! [`DocStore`] composes the object, reference and metadata stores over one
//! database connection and is the single entry point a version-control
//! engine needs. Open one with [`open_store`] or [`DocStore::open`]:
//!
//! ```no_run
//! # async fn run() -> docgit::DocResult<()> {
//! let (store, created) = docgit::open_store("http://localhost:8529", "repo").await?;
//! if created {
//!     store.init().await?;
//! }
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod store;

pub use error::{DocError, DocResult};
pub use store::{open_store, DocStore, Storer};

// Re-export the pieces callers need alongside the store.
pub use docgit_gateway::{Gateway, GatewayConfig, InMemoryClient};
pub use docgit_meta::{Index, IndexEntry, MetaStore, RepoConfig};
pub use docgit_refs::{RefIter, RefStore};
pub use docgit_store::{ObjectIter, ObjectStore};
pub use docgit_types::{EncodedObject, ObjectHash, ObjectType, Reference, ReferenceName};
