//! PEP 691 JSON simple API: list every distribution file of a project.

use std::collections::BTreeMap;

use reqwest::blocking::Client;
use serde::Deserialize;

use reqfold_core::candidate::Candidate;
use reqfold_core::link::Link;
use reqfold_util::errors::ReqfoldError;

use crate::dist;
use crate::download;
use crate::repository::PackageIndex;

/// Content type of the PEP 691 JSON project page.
pub const SIMPLE_JSON_ACCEPT: &str = "application/vnd.pypi.simple.v1+json";

#[derive(Debug, Deserialize)]
struct ProjectPage {
    #[serde(default)]
    files: Vec<FileEntry>,
}

#[derive(Debug, Deserialize)]
struct FileEntry {
    filename: String,
    url: String,
    #[serde(default)]
    hashes: BTreeMap<String, String>,
    #[serde(default)]
    yanked: Yanked,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Yanked {
    Flag(bool),
    Reason(String),
}

impl Default for Yanked {
    fn default() -> Self {
        Yanked::Flag(false)
    }
}

impl Yanked {
    fn is_yanked(&self) -> bool {
        match self {
            Yanked::Flag(flag) => *flag,
            Yanked::Reason(_) => true,
        }
    }
}

/// Index query service backed by a simple repository.
pub struct SimpleIndex {
    index: PackageIndex,
    client: Client,
}

impl SimpleIndex {
    pub fn new(index: PackageIndex, client: Client) -> Self {
        Self { index, client }
    }

    pub fn index(&self) -> &PackageIndex {
        &self.index
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Every installable, non-yanked distribution of `name`. An unknown
    /// project yields an empty list.
    pub fn find_all_candidates(&self, name: &str) -> miette::Result<Vec<Candidate>> {
        let url = self.index.project_url(name);
        tracing::debug!("Querying {url}");
        let Some(body) =
            download::fetch_text(&self.client, &self.index, &url, Some(SIMPLE_JSON_ACCEPT))?
        else {
            tracing::debug!("{name} not found on {}", self.index.url);
            return Ok(Vec::new());
        };
        Ok(parse_project_page(&body, &url, name)?)
    }
}

/// Parse a PEP 691 project page fetched from `page_url`.
pub fn parse_project_page(
    body: &str,
    page_url: &str,
    project: &str,
) -> Result<Vec<Candidate>, ReqfoldError> {
    let page: ProjectPage = serde_json::from_str(body).map_err(|e| ReqfoldError::Metadata {
        message: format!("Malformed project page {page_url}: {e}"),
    })?;
    let base = url::Url::parse(page_url).ok();

    let mut candidates = Vec::new();
    for file in page.files {
        if file.yanked.is_yanked() {
            continue;
        }
        let Some(dist) = dist::parse_filename(&file.filename, project) else {
            tracing::trace!("Skipping {}", file.filename);
            continue;
        };
        let mut href = match base.as_ref().and_then(|b| b.join(&file.url).ok()) {
            Some(joined) => joined.to_string(),
            None => file.url.clone(),
        };
        if !href.contains('#') {
            if let Some(sha) = file.hashes.get("sha256") {
                href = format!("{href}#sha256={sha}");
            }
        }
        candidates.push(Candidate::new(dist.name, dist.version, Some(Link::new(href))));
    }
    Ok(candidates)
}
