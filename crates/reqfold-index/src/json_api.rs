//! Remote metadata service: the index's JSON API
//! (`<json-url>/<name>/<version>/json`).

use reqwest::blocking::Client;
use serde::Deserialize;
use thiserror::Error;

use crate::download;
use crate::repository::PackageIndex;

/// Declared metadata of one release.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ReleaseMetadata {
    pub name: String,
    pub version: String,
    /// `None` when the release does not declare its dependencies at all.
    pub requires: Option<Vec<String>>,
    pub requires_python: Option<String>,
}

/// Why a metadata lookup produced no answer.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum MetadataError {
    #[error("release not found")]
    NotFound,
    #[error("malformed metadata response: {0}")]
    Malformed(String),
    #[error("metadata request failed: {0}")]
    Transport(String),
}

#[derive(Debug, Deserialize)]
struct ReleaseDocument {
    info: ReleaseInfo,
}

#[derive(Debug, Deserialize)]
struct ReleaseInfo {
    name: String,
    version: String,
    #[serde(default)]
    requires_dist: Option<Vec<String>>,
    #[serde(default)]
    requires: Option<Vec<String>>,
    #[serde(default)]
    requires_python: Option<String>,
}

/// Client for the JSON release API.
pub struct JsonApi {
    index: PackageIndex,
    client: Client,
}

impl JsonApi {
    pub fn new(index: PackageIndex, client: Client) -> Self {
        Self { index, client }
    }

    /// Fetch the release document for `name==version`.
    pub fn get(&self, name: &str, version: &str) -> Result<ReleaseMetadata, MetadataError> {
        let url = self.index.release_json_url(name, version);
        tracing::debug!("Fetching release metadata {url}");
        match download::fetch_text(&self.client, &self.index, &url, Some("application/json")) {
            Ok(Some(body)) => parse_release(&body),
            Ok(None) => Err(MetadataError::NotFound),
            Err(e) => Err(MetadataError::Transport(e.to_string())),
        }
    }
}

/// Parse a JSON API release document. `info.requires_dist` is preferred,
/// falling back to the legacy `info.requires`.
pub fn parse_release(body: &str) -> Result<ReleaseMetadata, MetadataError> {
    let doc: ReleaseDocument =
        serde_json::from_str(body).map_err(|e| MetadataError::Malformed(e.to_string()))?;
    let info = doc.info;
    Ok(ReleaseMetadata {
        name: info.name,
        version: info.version,
        requires: info.requires_dist.or(info.requires),
        requires_python: info.requires_python.filter(|s| !s.is_empty()),
    })
}
