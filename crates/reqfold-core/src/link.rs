use std::fmt;
use std::path::{Path, PathBuf};

const ARCHIVE_SUFFIXES: [&str; 7] = [".whl", ".zip", ".tar.gz", ".tgz", ".tar.bz2", ".tar.xz", ".tar"];

/// Location of an artifact or source tree: an index file URL, a direct
/// reference, or a `file://` path to a local checkout.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Link {
    url: String,
}

impl Link {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }

    /// A `file://` link for a local path; relative paths are made absolute.
    pub fn from_path(path: &Path) -> Self {
        let absolute = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
        let text = absolute.to_string_lossy().replace('\\', "/");
        if text.starts_with('/') {
            Self::new(format!("file://{text}"))
        } else {
            Self::new(format!("file:///{text}"))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.url
    }

    /// The URL with any `#fragment` removed.
    pub fn without_fragment(&self) -> &str {
        self.url.split('#').next().unwrap_or(&self.url)
    }

    /// Value of `key` in the fragment, e.g. `egg` in `#egg=name&subdirectory=x`.
    pub fn fragment_value(&self, key: &str) -> Option<&str> {
        let (_, fragment) = self.url.split_once('#')?;
        fragment
            .split('&')
            .filter_map(|pair| pair.split_once('='))
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v)
    }

    /// Final path segment, without query or fragment.
    pub fn filename(&self) -> &str {
        let base = self.without_fragment();
        let base = base.split('?').next().unwrap_or(base);
        base.trim_end_matches('/').rsplit('/').next().unwrap_or(base)
    }

    pub fn is_wheel(&self) -> bool {
        self.filename().ends_with(".whl")
    }

    pub fn is_file(&self) -> bool {
        self.url.starts_with("file:")
    }

    pub fn is_vcs(&self) -> bool {
        ["git+", "hg+", "svn+", "bzr+"]
            .iter()
            .any(|scheme| self.url.starts_with(scheme))
    }

    pub fn is_archive(&self) -> bool {
        let name = self.filename().to_ascii_lowercase();
        ARCHIVE_SUFFIXES.iter().any(|suffix| name.ends_with(suffix))
    }

    /// Local filesystem path of a `file:` link.
    pub fn to_path(&self) -> Option<PathBuf> {
        let rest = self.without_fragment().strip_prefix("file:")?;
        let rest = match rest.strip_prefix("//") {
            Some(authority) => authority.strip_prefix("localhost").unwrap_or(authority),
            None => rest,
        };
        let decoded = rest.replace("%20", " ");
        // `file:///C:/x` on Windows.
        let trimmed = match decoded.as_bytes() {
            [b'/', drive, b':', ..] if drive.is_ascii_alphabetic() => &decoded[1..],
            _ => &decoded,
        };
        Some(PathBuf::from(trimmed))
    }
}

impl fmt::Display for Link {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.url)
    }
}
