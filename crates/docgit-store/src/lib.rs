//! Git object storage for docgit.
//!
//! Objects live in the `objects` collection, one document per
//! `(hash, type)` pair:
//!
//! ```json
//! { "hash": "<40 hex>", "type": "blob", "object": "<base64 payload>" }
//! ```
//!
//! # Design Rules
//!
//! 1. Objects are immutable and content-addressed, so every write is an
//!    upsert keyed by `(hash, type)`. Writing twice is harmless.
//! 2. Delta-encoded objects are a pack concern and are never stored.
//! 3. Uniqueness of `(hash, type)` is application discipline only; more than
//!    one match on a lookup is reported as [`StoreError::TooManyResults`].
//! 4. Only blobs, commits and tags can be bulk-iterated.

pub mod document;
pub mod error;
pub mod traits;

pub use document::{DocumentObjectStore, ObjectIter};
pub use error::{StoreError, StoreResult};
pub use traits::ObjectStore;
