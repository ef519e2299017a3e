//! Foundation types for docgit.
//!
//! This crate provides the version-control object model shared by every
//! storage crate in the workspace. It holds no storage logic of its own.
//!
//! # Key Types
//!
//! - [`ObjectHash`]: SHA-1 content digest identifying an object
//! - [`ObjectType`]: blob, tree, commit, tag, the delta variants and `Any`
//! - [`EncodedObject`]: an object's type plus its raw encoded bytes
//! - [`ReferenceName`] / [`Reference`]: named pointers to hashes or other refs

pub mod error;
pub mod hash;
pub mod object;
pub mod reference;

pub use error::TypeError;
pub use hash::ObjectHash;
pub use object::{EncodedObject, ObjectType};
pub use reference::{Reference, ReferenceName};
