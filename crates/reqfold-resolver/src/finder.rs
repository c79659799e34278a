//! Candidate resolution: which known distributions satisfy a requirement.

use std::collections::BTreeSet;

use reqfold_core::candidate::Candidate;
use reqfold_core::requirement::Requirement;
use reqfold_core::version::Version;

use crate::provider::IndexQuery;

/// Every candidate of `requirement`'s project whose version the specifier
/// admits, sorted by version.
///
/// Pre-releases are only considered when `allow_prereleases` is set, or
/// when nothing else matches. An empty result is a legitimate "no match".
pub fn find_all_matches(
    index: &dyn IndexQuery,
    requirement: &Requirement,
    allow_prereleases: bool,
) -> miette::Result<Vec<Candidate>> {
    let candidates = index.find_all_candidates(&requirement.canonical_name())?;
    let versions: BTreeSet<Version> = candidates.iter().map(|c| c.version.clone()).collect();

    let specifier = requirement.specifier();
    let mut allowed = specifier.filter(&versions, allow_prereleases);
    if allowed.is_empty() && !allow_prereleases {
        allowed = specifier.filter(&versions, true);
        if !allowed.is_empty() {
            tracing::debug!("{requirement}: only pre-releases match");
        }
    }

    let mut matches: Vec<Candidate> = candidates
        .into_iter()
        .filter(|c| allowed.contains(&c.version))
        .collect();
    matches.sort_by(|a, b| a.version.cmp(&b.version).then(rank(a).cmp(&rank(b))));
    tracing::debug!("{requirement}: {} matching distributions", matches.len());
    Ok(matches)
}

/// One candidate per version, preferring universal wheels, then other
/// wheels, then source distributions. Input must be sorted by version.
pub fn best_per_version(candidates: Vec<Candidate>) -> Vec<Candidate> {
    let mut best: Vec<Candidate> = Vec::new();
    for candidate in candidates {
        match best.last_mut() {
            Some(last) if last.version == candidate.version => {
                if rank(&candidate) < rank(last) {
                    *last = candidate;
                }
            }
            _ => best.push(candidate),
        }
    }
    best
}

fn rank(candidate: &Candidate) -> u8 {
    match &candidate.link {
        Some(link) if link.filename().ends_with("-none-any.whl") => 0,
        Some(link) if link.is_wheel() => 1,
        Some(_) => 2,
        None => 3,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeIndex;
    use reqfold_core::link::Link;

    fn versions(found: &[Candidate]) -> Vec<String> {
        found.iter().map(|c| c.version.to_string()).collect()
    }

    #[test]
    fn filters_by_specifier() {
        let index = FakeIndex::default().with("demo", &["1.0", "1.5", "2.0", "3.0"]);
        let req = Requirement::parse("demo>=1.5,<3").unwrap();
        let found = find_all_matches(&index, &req, false).unwrap();
        assert_eq!(versions(&found), vec!["1.5", "2.0"]);
        assert_eq!(index.calls(), 1);
    }

    #[test]
    fn prereleases_excluded_while_finals_match() {
        let index = FakeIndex::default().with("demo", &["1.0", "2.0b1"]);
        let req = Requirement::parse("demo>=1").unwrap();
        assert_eq!(versions(&find_all_matches(&index, &req, false).unwrap()), vec!["1.0"]);
        assert_eq!(
            versions(&find_all_matches(&index, &req, true).unwrap()),
            vec!["1.0", "2.0b1"]
        );
    }

    #[test]
    fn widens_to_prereleases_only_when_empty() {
        let index = FakeIndex::default().with("demo", &["1.0", "2.1rc1"]);
        let req = Requirement::parse("demo>=2").unwrap();
        assert_eq!(versions(&find_all_matches(&index, &req, false).unwrap()), vec!["2.1rc1"]);

        let req = Requirement::parse("demo>=3").unwrap();
        assert!(find_all_matches(&index, &req, false).unwrap().is_empty());
    }

    #[test]
    fn queries_the_index_by_canonical_name() {
        let index = FakeIndex::default().with("zope-interface", &["5.0", "6.0"]);
        let req = Requirement::parse("Zope.Interface>=5.5").unwrap();
        assert_eq!(versions(&find_all_matches(&index, &req, false).unwrap()), vec!["6.0"]);
    }

    #[test]
    fn unknown_project_is_empty() {
        let index = FakeIndex::default();
        let req = Requirement::parse("missing").unwrap();
        assert!(find_all_matches(&index, &req, false).unwrap().is_empty());
    }

    #[test]
    fn keeps_best_artifact_per_version() {
        let v = |s: &str| Version::parse(s).unwrap();
        let link = |f: &str| Some(Link::new(format!("https://files.example/{f}")));
        let found = best_per_version(vec![
            Candidate::new("demo", v("1.0"), link("demo-1.0.tar.gz")),
            Candidate::new("demo", v("1.0"), link("demo-1.0-py3-none-any.whl")),
            Candidate::new("demo", v("2.0"), link("demo-2.0-cp312-cp312-win_amd64.whl")),
            Candidate::new("demo", v("2.0"), link("demo-2.0.tar.gz")),
        ]);
        assert_eq!(found.len(), 2);
        assert!(found[0].link.as_ref().unwrap().filename().ends_with("none-any.whl"));
        assert!(found[1].is_wheel());
    }
}
