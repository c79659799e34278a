//! Package index abstraction: URL layout and credentials.

use reqfold_core::config::IndexConfig;
use reqfold_core::requirement::canonical_name;

/// PyPI simple index base URL.
pub const PYPI_SIMPLE_URL: &str = "https://pypi.org/simple";

/// PyPI JSON API base URL.
pub const PYPI_JSON_URL: &str = "https://pypi.org/pypi";

/// A configured package index with optional credentials.
#[derive(Debug, Clone)]
pub struct PackageIndex {
    pub name: String,
    pub url: String,
    pub json_url: String,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl PackageIndex {
    /// Build a `PackageIndex` from the `[index]` section of the user config.
    pub fn from_config(config: &IndexConfig) -> Self {
        Self {
            name: "default".to_string(),
            url: config.url.trim_end_matches('/').to_string(),
            json_url: config.json_url.trim_end_matches('/').to_string(),
            username: config.username.clone(),
            password: config.password.clone(),
        }
    }

    /// Construct the default PyPI index.
    pub fn pypi() -> Self {
        Self {
            name: "pypi".to_string(),
            url: PYPI_SIMPLE_URL.to_string(),
            json_url: PYPI_JSON_URL.to_string(),
            username: None,
            password: None,
        }
    }

    /// Replace the simple index URL, keeping credentials.
    pub fn with_url(mut self, url: &str) -> Self {
        self.url = url.trim_end_matches('/').to_string();
        self
    }

    /// PEP 503 project page: `https://pypi.org/simple/zope-interface/`
    pub fn project_url(&self, name: &str) -> String {
        format!("{}/{}/", self.url, canonical_name(name))
    }

    /// JSON API release document: `https://pypi.org/pypi/requests/2.31.0/json`
    pub fn release_json_url(&self, name: &str, version: &str) -> String {
        format!("{}/{}/{}/json", self.json_url, canonical_name(name), version)
    }

    /// Whether this index has authentication configured.
    pub fn has_auth(&self) -> bool {
        self.username.is_some() || self.password.is_some()
    }
}
