//! Persistent dependency cache.
//!
//! Maps a pinned requirement (`name[extras]==version`) to the dependency
//! lines it declares. A released version's metadata never changes, so
//! entries are never invalidated; the file is rewritten after every insert.
//!
//! On disk:
//!
//! ```json
//! {"__format__": 1, "dependencies": {"requests==2.31.0": ["idna<4,>=2.5"]}}
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use reqfold_util::errors::ReqfoldError;
use reqfold_util::fs::write_atomic;
use serde::{Deserialize, Serialize};

const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct CacheDocument {
    #[serde(rename = "__format__")]
    format: u32,
    #[serde(default)]
    dependencies: BTreeMap<String, Vec<String>>,
}

#[derive(Debug, Default)]
pub struct DependencyCache {
    path: Option<PathBuf>,
    entries: BTreeMap<String, Vec<String>>,
}

impl DependencyCache {
    /// Open the cache file at `path`. A missing file starts empty; an
    /// unreadable or foreign file is logged and also starts empty.
    pub fn load(path: &Path) -> Self {
        let entries = match fs::read_to_string(path) {
            Ok(text) => match serde_json::from_str::<CacheDocument>(&text) {
                Ok(doc) if doc.format == FORMAT_VERSION => doc.dependencies,
                Ok(doc) => {
                    tracing::warn!(
                        "Ignoring dependency cache {} with format {}",
                        path.display(),
                        doc.format
                    );
                    BTreeMap::new()
                }
                Err(e) => {
                    tracing::warn!("Ignoring corrupt dependency cache {}: {e}", path.display());
                    BTreeMap::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => {
                tracing::warn!("Cannot read dependency cache {}: {e}", path.display());
                BTreeMap::new()
            }
        };
        tracing::debug!("Loaded {} cached dependency lists", entries.len());
        Self {
            path: Some(path.to_path_buf()),
            entries,
        }
    }

    /// A cache that is never written to disk.
    pub fn in_memory() -> Self {
        Self::default()
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn get(&self, key: &str) -> Option<&[String]> {
        self.entries.get(key).map(Vec::as_slice)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Record `dependencies` under `key`, replacing any earlier entry, and
    /// persist the whole cache.
    pub fn insert(&mut self, key: impl Into<String>, dependencies: Vec<String>) -> miette::Result<()> {
        let key = key.into();
        tracing::debug!("Caching {} dependencies for {key}", dependencies.len());
        self.entries.insert(key, dependencies);
        self.save()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// Drop every entry, on disk as well.
    pub fn clear(&mut self) -> miette::Result<()> {
        self.entries.clear();
        match &self.path {
            Some(path) if path.exists() => {
                fs::remove_file(path).map_err(|e| ReqfoldError::Cache {
                    message: format!("Failed to remove {}: {e}", path.display()),
                })?;
                Ok(())
            }
            _ => Ok(()),
        }
    }

    fn save(&self) -> miette::Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let doc = CacheDocument {
            format: FORMAT_VERSION,
            dependencies: self.entries.clone(),
        };
        let json = serde_json::to_vec_pretty(&doc).map_err(|e| ReqfoldError::Cache {
            message: format!("Failed to serialize dependency cache: {e}"),
        })?;
        write_atomic(path, &json).map_err(|e| ReqfoldError::Cache {
            message: format!("Failed to write {}: {e}", path.display()),
        })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn deps(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn in_memory_roundtrip() {
        let mut cache = DependencyCache::in_memory();
        assert!(cache.is_empty());
        cache.insert("foo==1.0", deps(&["bar>=1"])).unwrap();
        assert!(cache.contains("foo==1.0"));
        assert_eq!(cache.get("foo==1.0"), Some(&deps(&["bar>=1"])[..]));
        assert_eq!(cache.get("foo==2.0"), None);
        assert!(cache.path().is_none());
    }

    #[test]
    fn persists_between_loads() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("depcache.json");
        {
            let mut cache = DependencyCache::load(&path);
            cache.insert("foo==1.0", deps(&["bar>=1"])).unwrap();
            cache.insert("baz[x]==2.0", Vec::new()).unwrap();
        }
        let text = fs::read_to_string(&path).unwrap();
        assert!(text.contains("\"__format__\": 1"));

        let cache = DependencyCache::load(&path);
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get("baz[x]==2.0"), Some(&[][..]));
        let keys: Vec<&str> = cache.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["baz[x]==2.0", "foo==1.0"]);
    }

    #[test]
    fn corrupt_or_foreign_file_starts_empty() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("depcache.json");
        fs::write(&path, "{not json").unwrap();
        assert!(DependencyCache::load(&path).is_empty());

        fs::write(&path, r#"{"__format__": 7, "dependencies": {"a==1": []}}"#).unwrap();
        assert!(DependencyCache::load(&path).is_empty());
    }

    #[test]
    fn clear_removes_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("depcache.json");
        let mut cache = DependencyCache::load(&path);
        cache.insert("foo==1.0", Vec::new()).unwrap();
        assert!(path.exists());
        cache.clear().unwrap();
        assert!(cache.is_empty());
        assert!(!path.exists());
    }
}
