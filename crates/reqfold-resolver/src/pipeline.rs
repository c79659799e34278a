//! Dependency retrieval pipeline.
//!
//! Answers "what does this exact candidate depend on?" by trying four
//! lookup tiers in a fixed order. The first tier that answers wins; if all
//! of them miss the candidate is unresolvable.

use std::collections::HashSet;
use std::fmt;

use reqfold_core::requirement::Requirement;
use reqfold_util::errors::ReqfoldError;

use crate::provider::MetadataError;
use crate::session::Session;

/// One lookup strategy, in priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tier {
    /// The persistent dependency cache.
    Cache,
    /// Metadata of an already downloaded artifact.
    ArtifactCache,
    /// The index's per-release metadata API.
    MetadataApi,
    /// Fetch and inspect the artifact itself.
    FullResolution,
}

impl Tier {
    pub const ORDER: [Tier; 4] = [
        Tier::Cache,
        Tier::ArtifactCache,
        Tier::MetadataApi,
        Tier::FullResolution,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Tier::Cache => "dependency cache",
            Tier::ArtifactCache => "artifact cache",
            Tier::MetadataApi => "metadata api",
            Tier::FullResolution => "full resolution",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a single tier made of a candidate. `Hit(vec![])` means "no
/// dependencies", which is different from `Miss`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Hit(Vec<String>),
    Miss,
}

/// A tier failure that was turned into an empty result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TierFailure {
    pub requirement: String,
    pub tier: Tier,
    pub message: String,
}

impl fmt::Display for TierFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}): {}", self.requirement, self.tier, self.message)
    }
}

/// Dependency lines of `candidate`, from the first tier that answers.
pub fn get_dependencies(candidate: &Requirement, session: &mut Session) -> miette::Result<Vec<String>> {
    for tier in Tier::ORDER {
        match try_tier(tier, candidate, session)? {
            Outcome::Hit(deps) => {
                tracing::debug!("{candidate}: {} dependencies from {tier}", deps.len());
                return Ok(dedup(deps));
            }
            Outcome::Miss => tracing::debug!("{candidate}: no answer from {tier}"),
        }
    }
    Err(ReqfoldError::DependencyResolution {
        requirement: candidate.to_string(),
    }
    .into())
}

/// Run one tier in isolation.
pub fn try_tier(tier: Tier, candidate: &Requirement, session: &mut Session) -> miette::Result<Outcome> {
    match tier {
        Tier::Cache => Ok(from_cache(candidate, session)),
        Tier::ArtifactCache => Ok(from_artifact_cache(candidate, session)),
        Tier::MetadataApi => from_metadata_api(candidate, session),
        Tier::FullResolution => Ok(from_full_resolution(candidate, session)),
    }
}

fn from_cache(candidate: &Requirement, session: &Session) -> Outcome {
    if candidate.is_editable() {
        return Outcome::Miss;
    }
    candidate
        .cache_key()
        .and_then(|key| session.cache().get(&key).map(<[String]>::to_vec))
        .map_or(Outcome::Miss, Outcome::Hit)
}

fn from_artifact_cache(candidate: &Requirement, session: &mut Session) -> Outcome {
    if candidate.is_editable() {
        return Outcome::Miss;
    }
    let (Some(artifacts), Some(link)) = (session.artifacts(), candidate.link()) else {
        return Outcome::Miss;
    };
    let Some(lines) = artifacts.lookup(link, candidate.name()).filter(|l| !l.is_empty()) else {
        return Outcome::Miss;
    };
    let Some(deps) = requested_by(candidate, &lines) else {
        return Outcome::Miss;
    };
    if let Some(key) = candidate.cache_key() {
        if !session.cache().contains(&key) {
            store(session, key, deps.clone());
        }
    }
    Outcome::Hit(deps)
}

/// Declared lines that apply to `candidate`: those gated on an extra are
/// kept only when the candidate asks for it. `None` if a line is unusable.
fn requested_by(candidate: &Requirement, lines: &[String]) -> Option<Vec<String>> {
    let mut deps = Vec::new();
    for line in lines {
        let dep = match Requirement::parse(line) {
            Ok(dep) => dep,
            Err(e) => {
                tracing::debug!("{candidate}: unusable artifact metadata line '{line}': {e}");
                return None;
            }
        };
        let extras = dep.markers().map(|m| m.extra_names()).unwrap_or_default();
        if extras.is_empty() || extras.iter().any(|e| candidate.extras().contains(e)) {
            deps.push(dep.to_string());
        }
    }
    Some(deps)
}

/// Extras are not resolved here: anything gated on an `extra` marker is
/// dropped from the answer.
fn from_metadata_api(candidate: &Requirement, session: &mut Session) -> miette::Result<Outcome> {
    if candidate.is_editable() {
        return Ok(Outcome::Miss);
    }
    let (Some(metadata), Some(version), Some(key)) =
        (session.metadata(), candidate.version(), candidate.cache_key())
    else {
        return Ok(Outcome::Miss);
    };

    let release = match metadata.get(candidate.name(), &version.to_string()) {
        Ok(release) => release,
        Err(MetadataError::Transport(message)) => {
            return Err(ReqfoldError::Network { message }.into());
        }
        Err(e) => {
            tracing::debug!("{candidate}: {e}");
            return Ok(Outcome::Miss);
        }
    };

    let mut deps = Vec::new();
    for line in release.requires.unwrap_or_default() {
        match Requirement::parse(&line) {
            Ok(dep) if dep.markers().is_some_and(|m| m.mentions_extra()) => {}
            Ok(dep) => deps.push(dep.to_string()),
            Err(e) => {
                tracing::debug!("{candidate}: unusable metadata line '{line}': {e}");
                return Ok(Outcome::Miss);
            }
        }
    }

    if !session.cache().contains(&key) {
        store(session, key, deps.clone());
    }
    Ok(Outcome::Hit(deps))
}

fn from_full_resolution(candidate: &Requirement, session: &mut Session) -> Outcome {
    let Some(full) = session.full_resolver() else {
        return Outcome::Miss;
    };
    match full.resolve_one(candidate) {
        Ok(reqs) => {
            let deps: Vec<String> = reqs.iter().map(ToString::to_string).collect();
            if !candidate.is_editable() {
                if let Some(key) = candidate.cache_key() {
                    store(session, key, deps.clone());
                }
            }
            Outcome::Hit(deps)
        }
        Err(e) => {
            tracing::warn!("Resolving {candidate} failed, assuming no dependencies: {e}");
            session.record_failure(TierFailure {
                requirement: candidate.to_string(),
                tier: Tier::FullResolution,
                message: e.to_string(),
            });
            Outcome::Hit(Vec::new())
        }
    }
}

/// A cache write failure never changes the lookup result.
fn store(session: &mut Session, key: String, deps: Vec<String>) {
    if let Err(e) = session.cache_mut().insert(key, deps) {
        tracing::warn!("{e}");
    }
}

fn dedup(deps: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    deps.into_iter().filter(|d| seen.insert(d.clone())).collect()
}
