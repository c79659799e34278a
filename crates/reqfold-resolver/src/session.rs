//! Explicit resolution context threaded through every engine call.

use crate::cache::DependencyCache;
use crate::pipeline::TierFailure;
use crate::provider::{ArtifactLookup, FullResolver, IndexQuery, MetadataService};

/// The dependency cache, the collaborators, and the failures swallowed so
/// far. A collaborator left unset makes its lookup tier answer "no answer".
pub struct Session<'a> {
    cache: &'a mut DependencyCache,
    index: Option<&'a dyn IndexQuery>,
    artifacts: Option<&'a dyn ArtifactLookup>,
    metadata: Option<&'a dyn MetadataService>,
    full: Option<&'a dyn FullResolver>,
    allow_prereleases: bool,
    diagnostics: Vec<TierFailure>,
}

impl<'a> Session<'a> {
    pub fn new(cache: &'a mut DependencyCache) -> Self {
        Self {
            cache,
            index: None,
            artifacts: None,
            metadata: None,
            full: None,
            allow_prereleases: false,
            diagnostics: Vec::new(),
        }
    }

    pub fn with_index(mut self, index: &'a dyn IndexQuery) -> Self {
        self.index = Some(index);
        self
    }

    pub fn with_artifacts(mut self, artifacts: &'a dyn ArtifactLookup) -> Self {
        self.artifacts = Some(artifacts);
        self
    }

    pub fn with_metadata(mut self, metadata: &'a dyn MetadataService) -> Self {
        self.metadata = Some(metadata);
        self
    }

    pub fn with_full_resolver(mut self, full: &'a dyn FullResolver) -> Self {
        self.full = Some(full);
        self
    }

    pub fn allow_prereleases(mut self, allow: bool) -> Self {
        self.allow_prereleases = allow;
        self
    }

    pub fn prereleases_allowed(&self) -> bool {
        self.allow_prereleases
    }

    pub fn cache(&self) -> &DependencyCache {
        self.cache
    }

    pub fn cache_mut(&mut self) -> &mut DependencyCache {
        self.cache
    }

    pub fn index(&self) -> Option<&'a dyn IndexQuery> {
        self.index
    }

    pub fn artifacts(&self) -> Option<&'a dyn ArtifactLookup> {
        self.artifacts
    }

    pub fn metadata(&self) -> Option<&'a dyn MetadataService> {
        self.metadata
    }

    pub fn full_resolver(&self) -> Option<&'a dyn FullResolver> {
        self.full
    }

    /// Failures the full-resolution tier turned into empty results.
    pub fn diagnostics(&self) -> &[TierFailure] {
        &self.diagnostics
    }

    pub fn take_diagnostics(&mut self) -> Vec<TierFailure> {
        std::mem::take(&mut self.diagnostics)
    }

    pub(crate) fn record_failure(&mut self, failure: TierFailure) {
        self.diagnostics.push(failure);
    }
}
