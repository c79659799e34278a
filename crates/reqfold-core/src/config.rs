use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use reqfold_util::errors::ReqfoldError;
use reqfold_util::fs::{expand_home, home_dir};

/// Environment variable that overrides `[cache] dir`.
pub const CACHE_DIR_ENV: &str = "REQFOLD_CACHE_DIR";

/// User configuration loaded from `~/.reqfold/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResolverConfig {
    #[serde(default)]
    pub index: IndexConfig,

    #[serde(default)]
    pub cache: CacheConfig,

    #[serde(default)]
    pub resolver: ResolverSettings,
}

/// Package index settings from `[index]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexConfig {
    #[serde(default = "default_index_url")]
    pub url: String,
    #[serde(default = "default_json_url", rename = "json-url")]
    pub json_url: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            url: default_index_url(),
            json_url: default_json_url(),
            username: None,
            password: None,
        }
    }
}

fn default_index_url() -> String {
    "https://pypi.org/simple".to_string()
}

fn default_json_url() -> String {
    "https://pypi.org/pypi".to_string()
}

/// Cache location from `[cache]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_cache_dir")]
    pub dir: String,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            dir: default_cache_dir(),
        }
    }
}

fn default_cache_dir() -> String {
    "~/.reqfold/cache".to_string()
}

/// Resolution behaviour from `[resolver]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolverSettings {
    #[serde(default, rename = "allow-prereleases")]
    pub allow_prereleases: bool,
    #[serde(default = "default_true", rename = "use-json-api")]
    pub use_json_api: bool,
    #[serde(default = "default_python")]
    pub python: String,
    #[serde(default = "default_timeout", rename = "timeout-secs")]
    pub timeout_secs: u64,
}

impl Default for ResolverSettings {
    fn default() -> Self {
        Self {
            allow_prereleases: false,
            use_json_api: true,
            python: default_python(),
            timeout_secs: default_timeout(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_python() -> String {
    "python3".to_string()
}

fn default_timeout() -> u64 {
    60
}

impl ResolverConfig {
    /// Load `~/.reqfold/config.toml`, or defaults if it doesn't exist.
    pub fn load() -> miette::Result<Self> {
        Self::load_from(&Self::default_path())
    }

    /// Load the configuration at `path`, or defaults if the file is absent.
    pub fn load_from(path: &Path) -> miette::Result<Self> {
        if !path.is_file() {
            tracing::debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path).map_err(|e| ReqfoldError::Config {
            message: format!("Failed to read {}: {e}", path.display()),
        })?;
        toml::from_str(&content).map_err(|e| {
            ReqfoldError::Config {
                message: format!("Failed to parse {}: {e}", path.display()),
            }
            .into()
        })
    }

    /// Returns the default path to the config file.
    pub fn default_path() -> PathBuf {
        dirs_path().join("config.toml")
    }

    /// Resolved cache directory: `$REQFOLD_CACHE_DIR` if set, else `[cache] dir`
    /// with `~` expanded.
    pub fn cache_dir(&self) -> PathBuf {
        match std::env::var(CACHE_DIR_ENV) {
            Ok(dir) if !dir.trim().is_empty() => expand_home(dir.trim()),
            _ => expand_home(&self.cache.dir),
        }
    }

    /// File backing the persistent dependency cache.
    pub fn depcache_path(&self) -> PathBuf {
        self.cache_dir().join("depcache.json")
    }

    /// Root of the local wheel cache.
    pub fn wheel_cache_dir(&self) -> PathBuf {
        self.cache_dir().join("wheels")
    }
}

/// Returns the path to the reqfold data directory (`~/.reqfold/`).
pub fn dirs_path() -> PathBuf {
    home_dir().join(".reqfold")
}
