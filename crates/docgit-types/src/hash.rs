use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha1::{Digest, Sha1};

use crate::error::TypeError;

/// Length of a SHA-1 digest in bytes.
pub const HASH_LEN: usize = 20;

/// Content digest identifying a version-control object.
///
/// The hash covers the *decoded* object (its type header plus content), so two
/// objects with the same hash are the same object. It is serialized as a
/// 40-character lowercase hex string, which is also the form persisted in the
/// document store.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct ObjectHash([u8; HASH_LEN]);

impl ObjectHash {
    /// The zero hash. Used as the hash of symbolic references.
    pub const ZERO: Self = Self([0u8; HASH_LEN]);

    /// Create an `ObjectHash` from a pre-computed digest.
    pub const fn from_raw(bytes: [u8; HASH_LEN]) -> Self {
        Self(bytes)
    }

    /// Compute the SHA-1 digest of arbitrary bytes.
    pub fn digest(data: &[u8]) -> Self {
        let mut hasher = Sha1::new();
        hasher.update(data);
        Self(hasher.finalize().into())
    }

    /// Returns `true` if this is the zero hash.
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; HASH_LEN]
    }

    /// The raw 20-byte digest.
    pub fn as_bytes(&self) -> &[u8; HASH_LEN] {
        &self.0
    }

    /// Hex-encoded string representation.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Short hex representation (first 7 characters, as git abbreviates).
    pub fn short_hex(&self) -> String {
        let mut s = self.to_hex();
        s.truncate(7);
        s
    }

    /// Parse from a 40-character hex string.
    pub fn from_hex(s: &str) -> Result<Self, TypeError> {
        let bytes = hex::decode(s).map_err(|e| TypeError::InvalidHex(e.to_string()))?;
        if bytes.len() != HASH_LEN {
            return Err(TypeError::InvalidLength {
                expected: HASH_LEN,
                actual: bytes.len(),
            });
        }
        let mut arr = [0u8; HASH_LEN];
        arr.copy_from_slice(&bytes);
        Ok(Self(arr))
    }
}

impl fmt::Debug for ObjectHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectHash({})", self.short_hex())
    }
}

impl fmt::Display for ObjectHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl FromStr for ObjectHash {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl From<[u8; HASH_LEN]> for ObjectHash {
    fn from(bytes: [u8; HASH_LEN]) -> Self {
        Self(bytes)
    }
}

impl From<ObjectHash> for [u8; HASH_LEN] {
    fn from(hash: ObjectHash) -> Self {
        hash.0
    }
}

impl Serialize for ObjectHash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for ObjectHash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn digest_is_deterministic() {
        assert_eq!(ObjectHash::digest(b"hello"), ObjectHash::digest(b"hello"));
        assert_ne!(ObjectHash::digest(b"hello"), ObjectHash::digest(b"world"));
    }

    #[test]
    fn digest_matches_known_sha1() {
        // sha1("abc")
        let hash = ObjectHash::digest(b"abc");
        assert_eq!(hash.to_hex(), "a9993e364706816aba3e25717850c26c9cd0d89d");
    }

    #[test]
    fn zero_hash() {
        assert!(ObjectHash::ZERO.is_zero());
        assert!(ObjectHash::default().is_zero());
        assert_eq!(ObjectHash::ZERO.to_hex(), "0".repeat(40));
    }

    #[test]
    fn rejects_wrong_length() {
        let err = ObjectHash::from_hex("abcd").unwrap_err();
        assert_eq!(err, TypeError::InvalidLength { expected: 20, actual: 2 });
    }

    #[test]
    fn rejects_non_hex() {
        assert!(matches!(
            ObjectHash::from_hex(&"zz".repeat(20)),
            Err(TypeError::InvalidHex(_))
        ));
    }

    #[test]
    fn short_hex_is_7_chars() {
        assert_eq!(ObjectHash::digest(b"x").short_hex().len(), 7);
    }

    #[test]
    fn serializes_as_hex_string() {
        let hash = ObjectHash::digest(b"serde");
        let json = serde_json::to_string(&hash).unwrap();
        assert_eq!(json, format!("\"{}\"", hash.to_hex()));
        let parsed: ObjectHash = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, hash);
    }

    proptest! {
        #[test]
        fn hex_parse_inverts_display(bytes in any::<[u8; 20]>()) {
            let hash = ObjectHash::from_raw(bytes);
            let parsed: ObjectHash = hash.to_string().parse().unwrap();
            prop_assert_eq!(parsed, hash);
        }
    }
}
