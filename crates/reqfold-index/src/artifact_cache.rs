//! Local wheel cache at `<cache dir>/wheels/`.
//!
//! Entries are keyed by the SHA-256 of the artifact URL (fragment removed)
//! and sharded as `ab/cd/ef/<rest>/<filename>.whl`.

use std::fs;
use std::io::{Read, Seek};
use std::path::{Path, PathBuf};

use reqfold_core::link::Link;
use reqfold_core::requirement::canonical_name;
use reqfold_util::errors::ReqfoldError;
use reqfold_util::fs::write_atomic;
use reqfold_util::hash::{sha256_bytes, sharded_path};

use crate::metadata::{parse_core_metadata, CoreMetadata};

#[derive(Debug, Clone)]
pub struct WheelCache {
    root: PathBuf,
}

impl WheelCache {
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
        }
    }

    /// The root directory of this cache.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding the artifact downloaded from `link`.
    pub fn entry_dir(&self, link: &Link) -> PathBuf {
        let digest = sha256_bytes(link.without_fragment().as_bytes());
        sharded_path(&digest)
            .into_iter()
            .fold(self.root.clone(), |dir, part| dir.join(part))
    }

    /// Path of the cached artifact for `link`, if present.
    pub fn get(&self, link: &Link) -> Option<PathBuf> {
        let path = self.entry_dir(link).join(link.filename());
        path.is_file().then_some(path)
    }

    /// Store an artifact, replacing any previous copy.
    pub fn put(&self, link: &Link, data: &[u8]) -> miette::Result<PathBuf> {
        let path = self.entry_dir(link).join(link.filename());
        write_atomic(&path, data).map_err(ReqfoldError::Io)?;
        tracing::debug!("Cached {} at {}", link.filename(), path.display());
        Ok(path)
    }

    /// Declared dependencies of the cached wheel behind `link`.
    ///
    /// `None` when the link is not a wheel, nothing is cached for it, the
    /// archive cannot be read, or it holds a different project.
    pub fn lookup(&self, link: &Link, name: &str) -> Option<Vec<String>> {
        if !link.is_wheel() {
            return None;
        }
        let path = self.get(link)?;
        match read_wheel_metadata(&path) {
            Ok(meta) if canonical_name(&meta.name) == canonical_name(name) => {
                Some(meta.requires_dist)
            }
            Ok(meta) => {
                tracing::warn!(
                    "Cached wheel {} is for {}, not {name}",
                    path.display(),
                    meta.name
                );
                None
            }
            Err(e) => {
                tracing::debug!("Unreadable cached wheel {}: {e}", path.display());
                None
            }
        }
    }

    /// Remove every cached artifact.
    pub fn clear(&self) -> miette::Result<()> {
        if self.root.is_dir() {
            fs::remove_dir_all(&self.root).map_err(ReqfoldError::Io)?;
        }
        Ok(())
    }
}

/// Read `*.dist-info/METADATA` from the wheel at `path`.
pub fn read_wheel_metadata(path: &Path) -> miette::Result<CoreMetadata> {
    let file = fs::File::open(path).map_err(ReqfoldError::Io)?;
    Ok(read_wheel_metadata_from(file)?)
}

/// Read `*.dist-info/METADATA` from any seekable wheel archive.
pub fn read_wheel_metadata_from<R: Read + Seek>(reader: R) -> Result<CoreMetadata, ReqfoldError> {
    let mut archive = zip::ZipArchive::new(reader).map_err(|e| ReqfoldError::Metadata {
        message: format!("Failed to open wheel: {e}"),
    })?;

    let entry_name = archive
        .file_names()
        .find(|name| {
            name.ends_with(".dist-info/METADATA") && name.matches('/').count() == 1
        })
        .map(str::to_string)
        .ok_or_else(|| ReqfoldError::Metadata {
            message: "wheel has no .dist-info/METADATA".to_string(),
        })?;

    let mut entry = archive
        .by_name(&entry_name)
        .map_err(|e| ReqfoldError::Metadata {
            message: format!("Zip entry error: {e}"),
        })?;
    let mut text = String::new();
    entry
        .read_to_string(&mut text)
        .map_err(|e| ReqfoldError::Metadata {
            message: format!("Failed to read {entry_name}: {e}"),
        })?;
    parse_core_metadata(&text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};
    use zip::write::SimpleFileOptions;

    fn wheel_bytes(name: &str, version: &str, requires: &[&str]) -> Vec<u8> {
        let mut buf = Cursor::new(Vec::new());
        {
            let mut zip = zip::ZipWriter::new(&mut buf);
            let dist_info = format!("{}-{version}.dist-info", name.replace('-', "_"));
            zip.start_file(format!("{}/__init__.py", name.replace('-', "_")), SimpleFileOptions::default())
                .unwrap();
            zip.write_all(b"").unwrap();
            zip.start_file(format!("{dist_info}/METADATA"), SimpleFileOptions::default())
                .unwrap();
            let mut meta = format!("Metadata-Version: 2.1\nName: {name}\nVersion: {version}\n");
            for req in requires {
                meta.push_str(&format!("Requires-Dist: {req}\n"));
            }
            zip.write_all(meta.as_bytes()).unwrap();
            zip.finish().unwrap();
        }
        buf.into_inner()
    }

    fn wheel_link(name: &str, version: &str) -> Link {
        Link::new(format!(
            "https://files.example/{name}-{version}-py3-none-any.whl#sha256=00"
        ))
    }

    #[test]
    fn entry_dir_is_sharded_and_ignores_fragment() {
        let cache = WheelCache::new(Path::new("/cache/wheels"));
        let a = cache.entry_dir(&Link::new("https://x/p-1.0-py3-none-any.whl#sha256=1"));
        let b = cache.entry_dir(&Link::new("https://x/p-1.0-py3-none-any.whl"));
        assert_eq!(a, b);
        assert_eq!(a.strip_prefix("/cache/wheels").unwrap().components().count(), 4);
    }

    #[test]
    fn put_then_lookup_reads_requires_dist() {
        let tmp = tempfile::tempdir().unwrap();
        let cache = WheelCache::new(tmp.path());
        let link = wheel_link("demo", "1.0");
        cache
            .put(&link, &wheel_bytes("demo", "1.0", &["idna>=2", "pytest; extra == 'test'"]))
            .unwrap();
        assert!(cache.get(&link).is_some());
        assert_eq!(
            cache.lookup(&link, "Demo"),
            Some(vec!["idna>=2".to_string(), "pytest; extra == 'test'".to_string()])
        );
    }

    #[test]
    fn lookup_misses() {
        let tmp = tempfile::tempdir().unwrap();
        let cache = WheelCache::new(tmp.path());
        let link = wheel_link("demo", "1.0");
        assert_eq!(cache.lookup(&link, "demo"), None);

        cache.put(&link, &wheel_bytes("demo", "1.0", &[])).unwrap();
        assert_eq!(cache.lookup(&link, "other"), None);
        assert_eq!(cache.lookup(&link, "demo"), Some(Vec::new()));

        let sdist = Link::new("https://files.example/demo-1.0.tar.gz");
        assert_eq!(cache.lookup(&sdist, "demo"), None);

        let broken = wheel_link("broken", "1.0");
        cache.put(&broken, b"not a zip").unwrap();
        assert_eq!(cache.lookup(&broken, "broken"), None);
    }

    #[test]
    fn clear_removes_everything() {
        let tmp = tempfile::tempdir().unwrap();
        let cache = WheelCache::new(&tmp.path().join("wheels"));
        let link = wheel_link("demo", "1.0");
        cache.put(&link, &wheel_bytes("demo", "1.0", &[])).unwrap();
        cache.clear().unwrap();
        assert!(cache.get(&link).is_none());
    }
}
