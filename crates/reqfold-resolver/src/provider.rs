//! Collaborator interfaces consulted by the engine.
//!
//! Each lookup strategy talks to the outside world through one of these
//! traits, so sessions can be wired to a real package index or to test
//! doubles. The `reqfold-index` types implement them below.

use reqfold_core::candidate::Candidate;
use reqfold_core::link::Link;
use reqfold_core::requirement::Requirement;
use reqfold_index::artifact_cache::WheelCache;
use reqfold_index::json_api::JsonApi;
use reqfold_index::simple::SimpleIndex;
use reqfold_index::source::SourceResolver;

pub use reqfold_index::json_api::{MetadataError, ReleaseMetadata};

/// Lists every known distribution of a project, given its canonical name.
pub trait IndexQuery {
    fn find_all_candidates(&self, name: &str) -> miette::Result<Vec<Candidate>>;
}

/// Reads declared dependencies out of locally cached artifacts.
pub trait ArtifactLookup {
    /// `None` when nothing usable is cached for `link`.
    fn lookup(&self, link: &Link, name: &str) -> Option<Vec<String>>;
}

/// Remote per-release metadata.
pub trait MetadataService {
    fn get(&self, name: &str, version: &str) -> Result<ReleaseMetadata, MetadataError>;
}

/// Resolves one requirement by building or inspecting its artifact.
pub trait FullResolver {
    fn resolve_one(&self, requirement: &Requirement) -> miette::Result<Vec<Requirement>>;
}

impl IndexQuery for SimpleIndex {
    fn find_all_candidates(&self, name: &str) -> miette::Result<Vec<Candidate>> {
        SimpleIndex::find_all_candidates(self, name)
    }
}

impl ArtifactLookup for WheelCache {
    fn lookup(&self, link: &Link, name: &str) -> Option<Vec<String>> {
        WheelCache::lookup(self, link, name)
    }
}

impl MetadataService for JsonApi {
    fn get(&self, name: &str, version: &str) -> Result<ReleaseMetadata, MetadataError> {
        JsonApi::get(self, name, version)
    }
}

impl FullResolver for SourceResolver {
    fn resolve_one(&self, requirement: &Requirement) -> miette::Result<Vec<Requirement>> {
        SourceResolver::resolve_one(self, requirement)
    }
}
