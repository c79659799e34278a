//! Abstract dependencies.
//!
//! An [`AbstractDependency`] is a requirement together with every candidate
//! release it admits, plus a lazily filled map from candidate to that
//! candidate's own dependencies. Declarations of the same project coming
//! from different parents are combined with [`AbstractDependency::merge`].

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use reqfold_core::marker::Marker;
use reqfold_core::requirement::{Requirement, RequirementKind};
use reqfold_core::specifier::SpecifierSet;
use reqfold_core::version::Version;
use reqfold_util::errors::ReqfoldError;

use crate::finder::{best_per_version, find_all_matches};
use crate::pipeline::get_dependencies;
use crate::session::Session;

type DependencyMap = BTreeMap<String, Vec<Requirement>>;

#[derive(Debug, Clone)]
pub struct AbstractDependency {
    name: String,
    specifier: SpecifierSet,
    markers: Option<Marker>,
    candidates: Vec<Requirement>,
    requirement: Requirement,
    parent: Option<Arc<Requirement>>,
    // Declared as one artifact (pin, editable, direct reference), directly
    // or by a side of a merge. Survives the merged specifier losing its pin.
    fixed: bool,
    // Shared by clones; merge builds a fresh, pruned map.
    dependencies: Arc<Mutex<DependencyMap>>,
}

/// What two abstract dependencies have in common.
#[derive(Debug)]
pub enum Compatible<'a> {
    /// One side is a single editable candidate, or a single direct
    /// reference without a known version, and takes precedence.
    Editable(&'a AbstractDependency),
    Versions(BTreeSet<Version>),
}

impl AbstractDependency {
    /// Build from a requirement. Pinned, editable and direct-reference
    /// requirements are their own single candidate; anything else asks the
    /// session's index for matching releases.
    pub fn from_requirement(
        requirement: Requirement,
        parent: Option<Arc<Requirement>>,
        session: &Session,
    ) -> miette::Result<Self> {
        let fixed = is_single_artifact(&requirement);
        let candidates = if fixed {
            vec![requirement.clone()]
        } else {
            let index = session.index().ok_or_else(|| ReqfoldError::Network {
                message: format!("No package index available to look up {requirement}"),
            })?;
            let found = find_all_matches(index, &requirement, session.prereleases_allowed())?;
            best_per_version(found)
                .iter()
                .map(|c| {
                    c.to_requirement(&requirement, parent.clone())
                        .with_constraint(requirement.is_constraint() || parent.is_some())
                })
                .collect()
        };

        Ok(Self {
            name: requirement.canonical_name(),
            specifier: requirement.specifier().clone(),
            markers: requirement.markers().cloned(),
            candidates,
            requirement,
            parent,
            fixed,
            dependencies: Arc::default(),
        })
    }

    /// Parse `line` and build from it.
    pub fn from_line(
        line: &str,
        parent: Option<Arc<Requirement>>,
        session: &Session,
    ) -> miette::Result<Self> {
        Self::from_requirement(Requirement::parse(line)?, parent, session)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn specifier(&self) -> &SpecifierSet {
        &self.specifier
    }

    pub fn markers(&self) -> Option<&Marker> {
        self.markers.as_ref()
    }

    /// Candidates in ascending version order.
    pub fn candidates(&self) -> &[Requirement] {
        &self.candidates
    }

    pub fn requirement(&self) -> &Requirement {
        &self.requirement
    }

    pub fn parent(&self) -> Option<&Arc<Requirement>> {
        self.parent.as_ref()
    }

    /// The newest candidate.
    pub fn best(&self) -> Option<&Requirement> {
        self.candidates.last()
    }

    /// Versions of all candidates; empty for a single candidate, where
    /// there is nothing to compare.
    pub fn version_set(&self) -> BTreeSet<Version> {
        if self.candidates.len() == 1 {
            return BTreeSet::new();
        }
        self.candidate_versions()
    }

    /// The versions both sides can agree on, or the side that wins outright
    /// when either is a single editable candidate (`self` checked first).
    ///
    /// A single pinned candidate contributes its own version, so it is
    /// compatible with any other side that offers that release.
    pub fn compatible_versions<'a>(&'a self, other: &'a AbstractDependency) -> Compatible<'a> {
        if self.wins_unconditionally() {
            return Compatible::Editable(self);
        }
        if other.wins_unconditionally() {
            return Compatible::Editable(other);
        }
        let mine = self.comparable_versions();
        let theirs = other.comparable_versions();
        Compatible::Versions(mine.intersection(&theirs).cloned().collect())
    }

    /// Combine two declarations of the same project.
    ///
    /// The result keeps `self`'s candidates whose version both sides accept,
    /// under the conjunction of both specifiers. Only dependency entries of
    /// surviving candidates are carried over. Two ranged declarations with
    /// nothing in common are a [`ReqfoldError::EmptyIntersection`]; when
    /// either side was declared as a single artifact, even through an
    /// earlier merge, the result is simply left without candidates.
    pub fn merge(&self, other: &AbstractDependency) -> Result<AbstractDependency, ReqfoldError> {
        let versions = match self.compatible_versions(other) {
            Compatible::Editable(winner) => return Ok(winner.clone()),
            Compatible::Versions(versions) => versions,
        };

        let specifier = self.specifier.intersect(&other.specifier);
        let requirement = self.requirement.clone().with_specifier(specifier.clone());
        let candidates: Vec<Requirement> = self
            .candidates
            .iter()
            .filter(|c| c.version().is_some_and(|v| versions.contains(v)))
            .cloned()
            .collect();

        if candidates.is_empty() {
            if !self.fixed && !other.fixed {
                return Err(ReqfoldError::EmptyIntersection {
                    name: self.requirement.name().to_string(),
                    left: self.requirement.to_string(),
                    right: other.requirement.to_string(),
                });
            }
            tracing::debug!(
                "No candidate of {} satisfies both {} and {}",
                self.name,
                self.requirement,
                other.requirement
            );
        }

        let mut seeded = DependencyMap::new();
        for source in [self, other] {
            let known = source.lock();
            for candidate in &candidates {
                let key = candidate.to_string();
                if let Some(deps) = known.get(&key) {
                    seeded.entry(key).or_insert_with(|| deps.clone());
                }
            }
        }

        Ok(AbstractDependency {
            name: self.name.clone(),
            specifier,
            markers: self.markers.clone(),
            candidates,
            requirement,
            parent: self.parent.clone(),
            fixed: self.fixed || other.fixed,
            dependencies: Arc::new(Mutex::new(seeded)),
        })
    }

    /// Dependencies of one candidate, each linked back to it as parent.
    /// Looked up once per candidate, then served from memory.
    pub fn dependencies_of(
        &self,
        candidate: &Requirement,
        session: &mut Session,
    ) -> miette::Result<Vec<Requirement>> {
        let key = candidate.to_string();
        if let Some(deps) = self.lock().get(&key) {
            return Ok(deps.clone());
        }

        let parent = Arc::new(candidate.clone());
        let mut deps = Vec::new();
        for line in get_dependencies(candidate, session)? {
            match Requirement::parse(&line) {
                Ok(dep) => deps.push(dep.with_parent(Some(Arc::clone(&parent)))),
                Err(e) => tracing::warn!("Skipping dependency of {candidate}: {e}"),
            }
        }
        self.lock().insert(key, deps.clone());
        Ok(deps)
    }

    /// Whether dependencies of `candidate` are already known in memory.
    pub fn has_dependencies_for(&self, candidate: &Requirement) -> bool {
        self.lock().contains_key(&candidate.to_string())
    }

    fn is_singleton(&self) -> bool {
        self.candidates.len() == 1
    }

    /// A single editable candidate, or a single direct reference whose
    /// version is unknown until it is built.
    fn wins_unconditionally(&self) -> bool {
        match self.candidates.as_slice() {
            [only] => only.is_editable() || (only.version().is_none() && only.link().is_some()),
            _ => false,
        }
    }

    fn candidate_versions(&self) -> BTreeSet<Version> {
        self.candidates
            .iter()
            .filter_map(|c| c.version().cloned())
            .collect()
    }

    fn comparable_versions(&self) -> BTreeSet<Version> {
        if self.is_singleton() {
            self.candidate_versions()
        } else {
            self.version_set()
        }
    }

    fn lock(&self) -> MutexGuard<'_, DependencyMap> {
        self.dependencies
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

/// A requirement that already names exactly one artifact.
fn is_single_artifact(requirement: &Requirement) -> bool {
    match requirement.kind() {
        RequirementKind::Pinned(_) | RequirementKind::Editable => true,
        RequirementKind::Ranged => requirement.link().is_some(),
    }
}

/// Abstract dependencies for a list of requirement lines, all declared by
/// `parent` (or by the user when `None`).
pub fn get_abstract_dependencies<S: AsRef<str>>(
    lines: &[S],
    parent: Option<Arc<Requirement>>,
    session: &Session,
) -> miette::Result<Vec<AbstractDependency>> {
    lines
        .iter()
        .map(|line| AbstractDependency::from_line(line.as_ref(), parent.clone(), session))
        .collect()
}
