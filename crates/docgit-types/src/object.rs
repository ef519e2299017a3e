use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sha1::{Digest, Sha1};

use crate::error::TypeError;
use crate::hash::ObjectHash;

/// The type of a version-control object.
///
/// The two delta variants only exist in pack streams; storage rejects them.
/// `Any` is a lookup wildcard and never describes a stored object.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ObjectType {
    Commit,
    Tree,
    Blob,
    Tag,
    /// Delta against a base addressed by pack offset.
    OfsDelta,
    /// Delta against a base addressed by hash.
    RefDelta,
    /// Wildcard: match an object of any type.
    Any,
}

impl ObjectType {
    /// Canonical lowercase name, also used as the persisted `type` value.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Commit => "commit",
            Self::Tree => "tree",
            Self::Blob => "blob",
            Self::Tag => "tag",
            Self::OfsDelta => "ofs-delta",
            Self::RefDelta => "ref-delta",
            Self::Any => "any",
        }
    }

    /// Returns `true` for the delta-encoded pack variants.
    pub fn is_delta(&self) -> bool {
        matches!(self, Self::OfsDelta | Self::RefDelta)
    }

    /// Returns `true` for the four object types that can be stored.
    pub fn is_storable(&self) -> bool {
        matches!(self, Self::Commit | Self::Tree | Self::Blob | Self::Tag)
    }
}

impl fmt::Display for ObjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ObjectType {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "commit" => Ok(Self::Commit),
            "tree" => Ok(Self::Tree),
            "blob" => Ok(Self::Blob),
            "tag" => Ok(Self::Tag),
            "ofs-delta" => Ok(Self::OfsDelta),
            "ref-delta" => Ok(Self::RefDelta),
            "any" => Ok(Self::Any),
            other => Err(TypeError::UnknownObjectType(other.to_string())),
        }
    }
}

/// An object in its encoded form: type tag plus raw bytes.
///
/// The store never interprets `data`. The hash is normally derived from the
/// type and content the way git does it, but callers holding a hash computed
/// elsewhere can attach it with [`EncodedObject::with_hash`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncodedObject {
    kind: ObjectType,
    data: Vec<u8>,
    hash: Option<ObjectHash>,
}

impl EncodedObject {
    /// Create a new encoded object from type and content.
    pub fn new(kind: ObjectType, data: impl Into<Vec<u8>>) -> Self {
        Self {
            kind,
            data: data.into(),
            hash: None,
        }
    }

    /// Attach a caller-computed hash instead of deriving one from content.
    pub fn with_hash(mut self, hash: ObjectHash) -> Self {
        self.hash = Some(hash);
        self
    }

    pub fn kind(&self) -> ObjectType {
        self.kind
    }

    pub fn set_kind(&mut self, kind: ObjectType) {
        self.kind = kind;
        self.hash = None;
    }

    /// The raw encoded bytes.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Replace the content. Any attached hash is discarded.
    pub fn set_data(&mut self, data: impl Into<Vec<u8>>) {
        self.data = data.into();
        self.hash = None;
    }

    pub fn into_data(self) -> Vec<u8> {
        self.data
    }

    /// Size of the content in bytes.
    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }

    /// The object's hash: the attached one, or `sha1("<type> <len>\0" ++ data)`.
    pub fn hash(&self) -> ObjectHash {
        if let Some(hash) = self.hash {
            return hash;
        }
        let mut hasher = Sha1::new();
        hasher.update(self.kind.as_str().as_bytes());
        hasher.update(b" ");
        hasher.update(self.data.len().to_string().as_bytes());
        hasher.update([0u8]);
        hasher.update(&self.data);
        ObjectHash::from_raw(hasher.finalize().into())
    }
}

impl Default for EncodedObject {
    fn default() -> Self {
        Self::new(ObjectType::Blob, Vec::new())
    }
}
