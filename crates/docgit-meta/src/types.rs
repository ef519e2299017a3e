//! Payload types for the index and config slots.

use std::collections::BTreeMap;

use docgit_types::ObjectHash;
use serde::{Deserialize, Serialize};

/// Index format version written for new indexes.
pub const DEFAULT_INDEX_VERSION: u32 = 2;

/// An entry in the staging index, representing a tracked file.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexEntry {
    /// Path relative to the worktree root.
    pub path: String,
    /// Hash of the file's blob.
    pub hash: ObjectHash,
    /// Git file mode, e.g. `0o100644`.
    pub mode: u32,
    /// File size in bytes.
    pub size: u64,
    /// Merge stage; 0 outside of a conflict.
    #[serde(default)]
    pub stage: u8,
}

impl IndexEntry {
    pub fn new(path: impl Into<String>, hash: ObjectHash, mode: u32, size: u64) -> Self {
        Self {
            path: path.into(),
            hash,
            mode,
            size,
            stage: 0,
        }
    }
}

/// The staging index, kept sorted by path.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Index {
    pub version: u32,
    #[serde(default)]
    pub entries: Vec<IndexEntry>,
}

impl Default for Index {
    fn default() -> Self {
        Self {
            version: DEFAULT_INDEX_VERSION,
            entries: Vec::new(),
        }
    }
}

impl Index {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, path: &str) -> Option<&IndexEntry> {
        self.entries.iter().find(|e| e.path == path)
    }

    /// Insert or replace the entry for `entry.path`.
    pub fn add(&mut self, entry: IndexEntry) {
        match self.entries.binary_search_by(|e| e.path.cmp(&entry.path)) {
            Ok(i) => self.entries[i] = entry,
            Err(i) => self.entries.insert(i, entry),
        }
    }

    pub fn remove(&mut self, path: &str) -> Option<IndexEntry> {
        let i = self.entries.iter().position(|e| e.path == path)?;
        Some(self.entries.remove(i))
    }
}

/// The `[core]` section.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    pub bare: bool,
    pub worktree: Option<String>,
}

/// A `[remote "<name>"]` section.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    pub urls: Vec<String>,
    /// Fetch refspecs.
    pub fetch: Vec<String>,
}

/// A `[branch "<name>"]` section.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BranchConfig {
    pub remote: Option<String>,
    /// Upstream reference merged by default, e.g. `refs/heads/main`.
    pub merge: Option<String>,
}

/// Repository configuration.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RepoConfig {
    pub core: CoreConfig,
    pub remotes: BTreeMap<String, RemoteConfig>,
    pub branches: BTreeMap<String, BranchConfig>,
}

impl RepoConfig {
    pub fn remote(&self, name: &str) -> Option<&RemoteConfig> {
        self.remotes.get(name)
    }

    /// Add a remote with the conventional fetch refspec.
    pub fn add_remote(&mut self, name: &str, url: impl Into<String>) {
        self.remotes.insert(
            name.to_string(),
            RemoteConfig {
                urls: vec![url.into()],
                fetch: vec![format!("+refs/heads/*:refs/remotes/{name}/*")],
            },
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(path: &str) -> IndexEntry {
        IndexEntry::new(path, ObjectHash::digest(path.as_bytes()), 0o100644, 3)
    }

    #[test]
    fn add_keeps_entries_sorted_and_unique() {
        let mut idx = Index::default();
        idx.add(entry("src/main.rs"));
        idx.add(entry("Cargo.toml"));
        idx.add(entry("README.md"));
        let mut replaced = entry("Cargo.toml");
        replaced.size = 99;
        idx.add(replaced);

        let paths: Vec<&str> = idx.entries.iter().map(|e| e.path.as_str()).collect();
        assert_eq!(paths, vec!["Cargo.toml", "README.md", "src/main.rs"]);
        assert_eq!(idx.get("Cargo.toml").unwrap().size, 99);
    }

    #[test]
    fn remove_entry() {
        let mut idx = Index::default();
        idx.add(entry("a"));
        assert!(idx.remove("a").is_some());
        assert!(idx.remove("a").is_none());
        assert!(idx.is_empty());
    }

    #[test]
    fn default_index_version() {
        assert_eq!(Index::default().version, DEFAULT_INDEX_VERSION);
    }

    #[test]
    fn add_remote_sets_fetch_refspec() {
        let mut cfg = RepoConfig::default();
        cfg.add_remote("origin", "https://example.com/repo.git");
        let origin = cfg.remote("origin").unwrap();
        assert_eq!(origin.urls, vec!["https://example.com/repo.git".to_string()]);
        assert_eq!(origin.fetch, vec!["+refs/heads/*:refs/remotes/origin/*".to_string()]);
    }

    #[test]
    fn config_tolerates_missing_sections() {
        let cfg: RepoConfig = serde_json::from_str(r#"{ "core": { "bare": true } }"#).unwrap();
        assert!(cfg.core.bare);
        assert!(cfg.remotes.is_empty());
        assert!(cfg.branches.is_empty());
    }
}
