mod common;

use common::CountingIndex;
use reqfold_core::requirement::Requirement;
use reqfold_resolver::abstract_dep::AbstractDependency;
use reqfold_resolver::cache::DependencyCache;
use reqfold_resolver::grouping::group_requirements;
use reqfold_resolver::session::Session;
use reqfold_util::errors::ReqfoldError;

fn versions(dep: &AbstractDependency) -> Vec<String> {
    dep.candidates()
        .iter()
        .filter_map(|c| c.version().map(|v| v.to_string()))
        .collect()
}

#[test]
fn test_prerelease_found_only_after_widening() {
    let index = CountingIndex::default().project("lib", &["1.0", "2.1a1"]);
    let mut cache = DependencyCache::in_memory();
    let session = Session::new(&mut cache).with_index(&index);

    let dep = AbstractDependency::from_line("lib>=2", None, &session).unwrap();
    assert_eq!(versions(&dep), vec!["2.1a1"]);

    let dep = AbstractDependency::from_line("lib>=3", None, &session).unwrap();
    assert!(dep.candidates().is_empty());
}

#[test]
fn test_prereleases_allowed_by_session() {
    let index = CountingIndex::default().project("lib", &["1.0", "2.1a1"]);
    let mut cache = DependencyCache::in_memory();
    let session = Session::new(&mut cache)
        .with_index(&index)
        .allow_prereleases(true);
    let dep = AbstractDependency::from_line("lib>=1", None, &session).unwrap();
    assert_eq!(versions(&dep), vec!["1.0", "2.1a1"]);
}

#[test]
fn test_version_set_matches_candidate_count() {
    let index = CountingIndex::default().project("lib", &["1.0", "1.1", "1.2"]);
    let mut cache = DependencyCache::in_memory();
    let session = Session::new(&mut cache).with_index(&index);

    let many = AbstractDependency::from_line("lib", None, &session).unwrap();
    assert_eq!(many.version_set().len(), 3);
    let one = AbstractDependency::from_line("lib>1.1", None, &session).unwrap();
    assert_eq!(one.candidates().len(), 1);
    assert!(one.version_set().is_empty());
}

#[test]
fn test_grouped_declarations_merge_like_abstract_dependencies() {
    let index = CountingIndex::default().project("pkg", &["0.5", "1.0", "2.0", "2.5", "3.0"]);
    let mut cache = DependencyCache::in_memory();
    let session = Session::new(&mut cache).with_index(&index);

    let lines = ["pkg>=1,<3", "pkg>=2"];
    let grouped = group_requirements(lines.map(|l| Requirement::parse(l).unwrap()));
    assert_eq!(grouped.len(), 1);
    let folded = AbstractDependency::from_requirement(grouped[0].clone(), None, &session).unwrap();

    let a = AbstractDependency::from_line(lines[0], None, &session).unwrap();
    let b = AbstractDependency::from_line(lines[1], None, &session).unwrap();
    let merged = a.merge(&b).unwrap();
    assert_eq!(versions(&folded), versions(&merged));
    assert_eq!(versions(&merged), vec!["2.0", "2.5"]);
}

#[test]
fn test_conflicting_ranges_are_reported() {
    let index = CountingIndex::default().project("pkg", &["1.0", "2.0", "3.0"]);
    let mut cache = DependencyCache::in_memory();
    let session = Session::new(&mut cache).with_index(&index);

    let a = AbstractDependency::from_line("pkg<2", None, &session).unwrap();
    let b = AbstractDependency::from_line("pkg>2", None, &session).unwrap();
    let err = b.merge(&a).unwrap_err();
    match err {
        ReqfoldError::EmptyIntersection { left, right, .. } => {
            assert_eq!(left, "pkg>2");
            assert_eq!(right, "pkg<2");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_editable_wins_in_both_orders() {
    let index = CountingIndex::default().project("pkg", &["1.0", "2.0"]);
    let mut cache = DependencyCache::in_memory();
    let session = Session::new(&mut cache).with_index(&index);

    let ranged = AbstractDependency::from_line("pkg>=1", None, &session).unwrap();
    let editable =
        AbstractDependency::from_line("-e file:///src/pkg#egg=pkg", None, &session).unwrap();
    assert!(ranged.merge(&editable).unwrap().candidates()[0].is_editable());
    assert!(editable.merge(&ranged).unwrap().candidates()[0].is_editable());
    assert_eq!(index.calls.get(), 1);
}
