//! Named references: branches, tags, remote-tracking refs and `HEAD`.
//!
//! A reference either points directly at an object hash or symbolically at
//! another reference. Both kinds share the two-string form used by the
//! version-control engine: `[name, target]`, where a symbolic target is
//! written `ref: <name>`.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;
use crate::hash::ObjectHash;

const SYMREF_PREFIX: &str = "ref:";
const HEADS_PREFIX: &str = "refs/heads/";
const TAGS_PREFIX: &str = "refs/tags/";
const REMOTES_PREFIX: &str = "refs/remotes/";

/// Hierarchical reference name such as `refs/heads/main` or `HEAD`.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReferenceName(String);

impl ReferenceName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// The `HEAD` reference.
    pub fn head() -> Self {
        Self("HEAD".into())
    }

    /// `refs/heads/<name>`.
    pub fn branch(name: &str) -> Self {
        Self(format!("{HEADS_PREFIX}{name}"))
    }

    /// `refs/tags/<name>`.
    pub fn tag(name: &str) -> Self {
        Self(format!("{TAGS_PREFIX}{name}"))
    }

    /// `refs/remotes/<remote>/<branch>`.
    pub fn remote(remote: &str, branch: &str) -> Self {
        Self(format!("{REMOTES_PREFIX}{remote}/{branch}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_branch(&self) -> bool {
        self.0.starts_with(HEADS_PREFIX)
    }

    pub fn is_tag(&self) -> bool {
        self.0.starts_with(TAGS_PREFIX)
    }

    pub fn is_remote(&self) -> bool {
        self.0.starts_with(REMOTES_PREFIX)
    }

    /// The name without its well-known prefix (`refs/heads/main` -> `main`).
    pub fn short(&self) -> &str {
        [HEADS_PREFIX, TAGS_PREFIX, REMOTES_PREFIX]
            .iter()
            .find_map(|prefix| self.0.strip_prefix(prefix))
            .unwrap_or(&self.0)
    }
}

impl fmt::Debug for ReferenceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ReferenceName({})", self.0)
    }
}

impl fmt::Display for ReferenceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ReferenceName {
    fn from(name: &str) -> Self {
        Self(name.to_string())
    }
}

impl From<String> for ReferenceName {
    fn from(name: String) -> Self {
        Self(name)
    }
}

impl AsRef<str> for ReferenceName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A named pointer into the object graph.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Reference {
    /// Points directly at an object.
    Hash { name: ReferenceName, hash: ObjectHash },
    /// Points at another reference (e.g. `HEAD -> refs/heads/main`).
    Symbolic {
        name: ReferenceName,
        target: ReferenceName,
    },
}

impl Reference {
    pub fn new_hash(name: impl Into<ReferenceName>, hash: ObjectHash) -> Self {
        Self::Hash {
            name: name.into(),
            hash,
        }
    }

    pub fn new_symbolic(name: impl Into<ReferenceName>, target: impl Into<ReferenceName>) -> Self {
        Self::Symbolic {
            name: name.into(),
            target: target.into(),
        }
    }

    /// Parse the engine's two-string form.
    ///
    /// A target starting with `ref:` is symbolic; anything else must be a
    /// 40-character hex hash.
    pub fn from_strings(name: &str, target: &str) -> Result<Self, TypeError> {
        if let Some(rest) = target.strip_prefix(SYMREF_PREFIX) {
            return Ok(Self::new_symbolic(name, rest.trim()));
        }
        Ok(Self::new_hash(name, ObjectHash::from_hex(target.trim())?))
    }

    /// Render the engine's two-string form: `[name, target]`.
    pub fn strings(&self) -> [String; 2] {
        match self {
            Self::Hash { name, hash } => [name.to_string(), hash.to_hex()],
            Self::Symbolic { name, target } => {
                [name.to_string(), format!("{SYMREF_PREFIX} {target}")]
            }
        }
    }

    pub fn name(&self) -> &ReferenceName {
        match self {
            Self::Hash { name, .. } | Self::Symbolic { name, .. } => name,
        }
    }

    /// The target hash. Symbolic references resolve to the zero hash here;
    /// following them is the engine's job.
    pub fn hash(&self) -> ObjectHash {
        match self {
            Self::Hash { hash, .. } => *hash,
            Self::Symbolic { .. } => ObjectHash::ZERO,
        }
    }

    /// The reference a symbolic ref points to.
    pub fn target(&self) -> Option<&ReferenceName> {
        match self {
            Self::Symbolic { target, .. } => Some(target),
            Self::Hash { .. } => None,
        }
    }

    pub fn is_symbolic(&self) -> bool {
        matches!(self, Self::Symbolic { .. })
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [name, target] = self.strings();
        write!(f, "{target} {name}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hash(seed: &[u8]) -> ObjectHash {
        ObjectHash::digest(seed)
    }

    #[test]
    fn name_constructors() {
        assert_eq!(ReferenceName::branch("main").as_str(), "refs/heads/main");
        assert_eq!(ReferenceName::tag("v1.0.0").as_str(), "refs/tags/v1.0.0");
        assert_eq!(
            ReferenceName::remote("origin", "main").as_str(),
            "refs/remotes/origin/main"
        );
        assert_eq!(ReferenceName::head().as_str(), "HEAD");
    }

    #[test]
    fn name_classification_and_short_form() {
        let branch = ReferenceName::branch("feature/deep/nested");
        assert!(branch.is_branch());
        assert!(!branch.is_tag());
        assert_eq!(branch.short(), "feature/deep/nested");

        let tag = ReferenceName::tag("v2");
        assert!(tag.is_tag());
        assert_eq!(tag.short(), "v2");

        assert!(ReferenceName::remote("origin", "dev").is_remote());
        assert_eq!(ReferenceName::head().short(), "HEAD");
    }

    #[test]
    fn hash_reference_strings() {
        let h = hash(b"tip");
        let r = Reference::new_hash(ReferenceName::branch("main"), h);
        assert_eq!(r.strings(), ["refs/heads/main".to_string(), h.to_hex()]);
        assert_eq!(Reference::from_strings("refs/heads/main", &h.to_hex()).unwrap(), r);
    }

    #[test]
    fn symbolic_reference_strings() {
        let r = Reference::new_symbolic(ReferenceName::head(), ReferenceName::branch("master"));
        assert_eq!(
            r.strings(),
            ["HEAD".to_string(), "ref: refs/heads/master".to_string()]
        );
        let parsed = Reference::from_strings("HEAD", "ref: refs/heads/master").unwrap();
        assert_eq!(parsed, r);
        assert_eq!(parsed.target(), Some(&ReferenceName::branch("master")));
    }

    #[test]
    fn symbolic_target_without_space() {
        let parsed = Reference::from_strings("HEAD", "ref:refs/heads/dev").unwrap();
        assert_eq!(parsed.target().unwrap().as_str(), "refs/heads/dev");
    }

    #[test]
    fn symbolic_hash_is_zero() {
        let r = Reference::new_symbolic("HEAD", "refs/heads/main");
        assert!(r.is_symbolic());
        assert!(r.hash().is_zero());
    }

    #[test]
    fn invalid_target_is_rejected() {
        assert!(Reference::from_strings("refs/heads/x", "not-a-hash").is_err());
    }

    #[test]
    fn display_matches_show_ref_layout() {
        let h = hash(b"d");
        let r = Reference::new_hash("refs/tags/v1", h);
        assert_eq!(r.to_string(), format!("{} refs/tags/v1", h.to_hex()));
    }
}
