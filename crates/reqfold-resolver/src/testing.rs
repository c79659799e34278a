//! Instrumented collaborators for unit tests.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;

use reqfold_core::candidate::Candidate;
use reqfold_core::link::Link;
use reqfold_core::requirement::Requirement;
use reqfold_core::version::Version;
use reqfold_util::errors::ReqfoldError;

use crate::provider::{
    ArtifactLookup, FullResolver, IndexQuery, MetadataError, MetadataService, ReleaseMetadata,
};

fn lines(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Serves a fixed list of versions per project.
#[derive(Default)]
pub struct FakeIndex {
    projects: BTreeMap<String, Vec<Candidate>>,
    calls: Cell<usize>,
}

impl FakeIndex {
    pub fn with(mut self, name: &str, versions: &[&str]) -> Self {
        let candidates = versions
            .iter()
            .map(|v| {
                Candidate::new(
                    name,
                    Version::parse(v).unwrap(),
                    Some(Link::new(format!(
                        "https://files.example/{name}-{v}-py3-none-any.whl"
                    ))),
                )
            })
            .collect();
        self.projects.insert(name.to_string(), candidates);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.get()
    }
}

impl IndexQuery for FakeIndex {
    fn find_all_candidates(&self, name: &str) -> miette::Result<Vec<Candidate>> {
        self.calls.set(self.calls.get() + 1);
        Ok(self.projects.get(name).cloned().unwrap_or_default())
    }
}

pub struct FakeArtifacts {
    deps: Vec<String>,
    calls: Cell<usize>,
}

impl FakeArtifacts {
    pub fn with(deps: &[&str]) -> Self {
        Self {
            deps: lines(deps),
            calls: Cell::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.get()
    }
}

impl ArtifactLookup for FakeArtifacts {
    fn lookup(&self, _link: &Link, _name: &str) -> Option<Vec<String>> {
        self.calls.set(self.calls.get() + 1);
        Some(self.deps.clone())
    }
}

pub struct FakeMetadata {
    answer: Result<Option<Vec<String>>, MetadataError>,
    calls: Cell<usize>,
}

impl Default for FakeMetadata {
    fn default() -> Self {
        Self::failing(MetadataError::NotFound)
    }
}

impl FakeMetadata {
    pub fn with(requires: &[&str]) -> Self {
        Self {
            answer: Ok(Some(lines(requires))),
            calls: Cell::new(0),
        }
    }

    /// A release that declares no dependency metadata at all.
    pub fn undeclared() -> Self {
        Self {
            answer: Ok(None),
            calls: Cell::new(0),
        }
    }

    pub fn failing(error: MetadataError) -> Self {
        Self {
            answer: Err(error),
            calls: Cell::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.get()
    }
}

impl MetadataService for FakeMetadata {
    fn get(&self, name: &str, version: &str) -> Result<ReleaseMetadata, MetadataError> {
        self.calls.set(self.calls.get() + 1);
        self.answer.clone().map(|requires| ReleaseMetadata {
            name: name.to_string(),
            version: version.to_string(),
            requires,
            requires_python: None,
        })
    }
}

/// Answers every requirement with the same dependency lines and remembers
/// what it was asked.
#[derive(Default)]
pub struct FakeResolver {
    deps: Vec<String>,
    seen: RefCell<Vec<String>>,
}

impl FakeResolver {
    pub fn with(deps: &[&str]) -> Self {
        Self {
            deps: lines(deps),
            seen: RefCell::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.seen.borrow().len()
    }
}

impl FullResolver for FakeResolver {
    fn resolve_one(&self, requirement: &Requirement) -> miette::Result<Vec<Requirement>> {
        self.seen.borrow_mut().push(requirement.to_string());
        Ok(self
            .deps
            .iter()
            .map(|d| Requirement::parse(d).unwrap())
            .collect())
    }
}

#[derive(Default)]
pub struct FailingResolver;

impl FullResolver for FailingResolver {
    fn resolve_one(&self, requirement: &Requirement) -> miette::Result<Vec<Requirement>> {
        Err(ReqfoldError::Metadata {
            message: format!("build of {requirement} failed"),
        }
        .into())
    }
}
