//! Reference storage for docgit.
//!
//! Every reference is one document in the `refs` collection holding the
//! engine's two-string form:
//!
//! ```json
//! { "name": "HEAD", "target": "ref: refs/heads/master" }
//! { "name": "refs/heads/master", "target": "<40 hex>" }
//! ```
//!
//! There is no packed/loose distinction in a document store, so packing is a
//! no-op and every reference counts as loose.

pub mod document;
pub mod error;
pub mod traits;

pub use document::{DocumentRefStore, RefIter};
pub use error::{RefError, Result};
pub use traits::RefStore;
