//! Auxiliary repository metadata for docgit.
//!
//! Three independent slots live in the `misc` collection, one document each:
//!
//! | slot    | `_key`        | payload field |
//! |---------|---------------|---------------|
//! | shallow | `shallow-key` | `shallow`     |
//! | index   | `index-key`   | `idx`         |
//! | config  | `config-key`  | `config`      |
//!
//! Payloads are stored as JSON text. A slot that was never written reads as
//! its empty value, so a brand-new repository needs no special casing.

pub mod document;
pub mod error;
pub mod traits;
pub mod types;

pub use document::DocumentMetaStore;
pub use error::{MetaError, MetaResult};
pub use traits::MetaStore;
pub use types::{BranchConfig, CoreConfig, Index, IndexEntry, RemoteConfig, RepoConfig};
