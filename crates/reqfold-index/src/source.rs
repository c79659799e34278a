//! Full resolution of a single requirement from its artifact: pick the
//! distribution, fetch it, and read what it declares.

use std::collections::BTreeSet;
use std::fs;
use std::sync::Arc;

use reqfold_core::candidate::Candidate;
use reqfold_core::link::Link;
use reqfold_core::requirement::Requirement;
use reqfold_core::version::Version;
use reqfold_util::errors::ReqfoldError;

use crate::artifact_cache::{read_wheel_metadata, WheelCache};
use crate::download;
use crate::setup_info::SetupInfo;
use crate::simple::SimpleIndex;
use crate::unpack::unpack_sdist;

/// Resolves a requirement's dependencies by inspecting the artifact itself.
pub struct SourceResolver {
    simple: SimpleIndex,
    wheels: WheelCache,
    python: String,
    allow_prereleases: bool,
}

impl SourceResolver {
    pub fn new(simple: SimpleIndex, wheels: WheelCache, python: impl Into<String>) -> Self {
        Self {
            simple,
            wheels,
            python: python.into(),
            allow_prereleases: false,
        }
    }

    pub fn with_prereleases(mut self, allow: bool) -> Self {
        self.allow_prereleases = allow;
        self
    }

    /// Declared dependencies of `requirement`. Requirements gated on an
    /// extra are kept only when `requirement` asks for that extra.
    pub fn resolve_one(&self, requirement: &Requirement) -> miette::Result<Vec<Requirement>> {
        let link = self.select_artifact(requirement)?;
        tracing::debug!("Resolving {requirement} from {link}");
        let declared = self.declared_dependencies(requirement, &link)?;

        let parent = Arc::new(requirement.clone());
        let mut deps = Vec::new();
        for line in declared {
            let dep = Requirement::parse(&line)?;
            if extra_applies(&dep, requirement.extras()) {
                deps.push(dep.with_parent(Some(Arc::clone(&parent))));
            }
        }
        Ok(deps)
    }

    /// The requirement's own link, or the best matching index artifact:
    /// highest admitted version, universal wheel first, then any wheel,
    /// then an sdist.
    fn select_artifact(&self, requirement: &Requirement) -> miette::Result<Link> {
        if let Some(link) = requirement.link() {
            return Ok(link.clone());
        }

        let candidates = self.simple.find_all_candidates(&requirement.canonical_name())?;
        let versions: BTreeSet<Version> = candidates.iter().map(|c| c.version.clone()).collect();
        let mut allowed = requirement
            .specifier()
            .filter(&versions, self.allow_prereleases);
        if allowed.is_empty() {
            allowed = requirement.specifier().filter(&versions, true);
        }
        let best = allowed.last().ok_or_else(|| ReqfoldError::Metadata {
            message: format!("No distribution of {requirement} found on the index"),
        })?;

        let mut matching: Vec<&Candidate> = candidates
            .iter()
            .filter(|c| &c.version == best && c.link.is_some())
            .collect();
        matching.sort_by_key(|c| artifact_rank(c));
        matching
            .first()
            .and_then(|c| c.link.clone())
            .ok_or_else(|| {
                ReqfoldError::Metadata {
                    message: format!("No downloadable artifact for {requirement}"),
                }
                .into()
            })
    }

    fn declared_dependencies(
        &self,
        requirement: &Requirement,
        link: &Link,
    ) -> miette::Result<Vec<String>> {
        if link.is_vcs() {
            return Err(ReqfoldError::Metadata {
                message: format!("Version control checkouts are not supported: {link}"),
            }
            .into());
        }

        if let Some(path) = link.to_path().filter(|p| p.is_dir()) {
            let root = match link.fragment_value("subdirectory") {
                Some(sub) => path.join(sub),
                None => path,
            };
            return Ok(SetupInfo::from_tree(&root, &self.python)?.dependencies(requirement.extras()));
        }

        if link.is_wheel() {
            let path = match self.wheels.get(link) {
                Some(path) => path,
                None => {
                    let data = self.fetch(link)?;
                    self.wheels.put(link, &data)?
                }
            };
            return Ok(read_wheel_metadata(&path)?.requires_dist);
        }

        let data = self.fetch(link)?;
        let scratch = tempfile::tempdir().map_err(ReqfoldError::Io)?;
        let mut root = unpack_sdist(link.filename(), &data, scratch.path())?;
        if let Some(sub) = link.fragment_value("subdirectory") {
            root = root.join(sub);
        }
        Ok(SetupInfo::from_tree(&root, &self.python)?.dependencies(requirement.extras()))
    }

    fn fetch(&self, link: &Link) -> miette::Result<Vec<u8>> {
        if let Some(path) = link.to_path() {
            return fs::read(&path).map_err(|e| ReqfoldError::Io(e).into());
        }
        download::download_artifact(
            self.simple.client(),
            self.simple.index(),
            link.without_fragment(),
            link.filename(),
        )?
        .ok_or_else(|| {
            ReqfoldError::Network {
                message: format!("{} not found", link.without_fragment()),
            }
            .into()
        })
    }
}

fn artifact_rank(candidate: &Candidate) -> u8 {
    match &candidate.link {
        Some(link) if link.filename().ends_with("-none-any.whl") => 0,
        Some(link) if link.is_wheel() => 1,
        _ => 2,
    }
}

fn extra_applies(dep: &Requirement, extras: &BTreeSet<String>) -> bool {
    match dep.markers() {
        None => true,
        Some(marker) => {
            let names = marker.extra_names();
            names.is_empty() || names.iter().any(|n| extras.contains(n))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extras_gate_dependencies() {
        let plain = Requirement::parse("idna>=2").unwrap();
        let gated = Requirement::parse("pysocks; extra == 'socks'").unwrap();
        let none = BTreeSet::new();
        let socks = BTreeSet::from(["socks".to_string()]);
        assert!(extra_applies(&plain, &none));
        assert!(!extra_applies(&gated, &none));
        assert!(extra_applies(&gated, &socks));
    }

    #[test]
    fn universal_wheels_rank_first() {
        let v = Version::parse("1.0").unwrap();
        let link = |f: &str| Some(Link::new(format!("https://x/{f}")));
        let sdist = Candidate::new("p", v.clone(), link("p-1.0.tar.gz"));
        let native = Candidate::new("p", v.clone(), link("p-1.0-cp311-cp311-linux_x86_64.whl"));
        let universal = Candidate::new("p", v, link("p-1.0-py3-none-any.whl"));
        assert!(artifact_rank(&universal) < artifact_rank(&native));
        assert!(artifact_rank(&native) < artifact_rank(&sdist));
    }
}
