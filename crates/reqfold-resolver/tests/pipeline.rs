mod common;

use common::{wheel_bytes, BrokenBuilds, CountingIndex, CountingMetadata};
use reqfold_core::link::Link;
use reqfold_core::requirement::Requirement;
use reqfold_index::artifact_cache::WheelCache;
use reqfold_resolver::cache::DependencyCache;
use reqfold_resolver::pipeline::{get_dependencies, try_tier, Outcome, Tier};
use reqfold_resolver::session::Session;
use reqfold_util::errors::ReqfoldError;

fn r(s: &str) -> Requirement {
    Requirement::parse(s).unwrap()
}

#[test]
fn test_seeded_cache_answers_without_collaborators() {
    let mut cache = DependencyCache::in_memory();
    cache.insert("foo==1.0", vec!["bar>=1".to_string()]).unwrap();
    let index = CountingIndex::default();
    let metadata = CountingMetadata::default();
    let builds = BrokenBuilds::default();
    let mut session = Session::new(&mut cache)
        .with_index(&index)
        .with_metadata(&metadata)
        .with_full_resolver(&builds);

    let deps = get_dependencies(&r("foo==1.0"), &mut session).unwrap();
    assert_eq!(deps, vec!["bar>=1"]);
    assert_eq!(index.calls.get(), 0);
    assert_eq!(metadata.calls.get(), 0);
    assert_eq!(builds.calls.get(), 0);
}

#[test]
fn test_cached_wheel_answers_and_backfills() {
    let tmp = tempfile::tempdir().unwrap();
    let wheels = WheelCache::new(&tmp.path().join("wheels"));
    let link = Link::new("https://files.example/demo-1.0-py3-none-any.whl#sha256=ab");
    wheels
        .put(&link, &wheel_bytes("demo", "1.0", &["idna>=2", "six"]))
        .unwrap();

    let mut cache = DependencyCache::load(&tmp.path().join("depcache.json"));
    let metadata = CountingMetadata::default();
    {
        let mut session = Session::new(&mut cache)
            .with_artifacts(&wheels)
            .with_metadata(&metadata);
        let candidate = r("demo==1.0").with_link(Some(link));
        let deps = get_dependencies(&candidate, &mut session).unwrap();
        assert_eq!(deps, vec!["idna>=2", "six"]);
    }
    assert_eq!(metadata.calls.get(), 0);

    let reloaded = DependencyCache::load(&tmp.path().join("depcache.json"));
    assert_eq!(reloaded.get("demo==1.0").unwrap(), &["idna>=2", "six"]);
}

#[test]
fn test_metadata_result_served_from_cache_next_time() {
    let mut cache = DependencyCache::in_memory();
    let metadata = CountingMetadata::default().release(
        "requests==2.31.0",
        &[
            "charset-normalizer<4,>=2",
            "idna<4,>=2.5",
            "PySocks!=1.5.7,>=1.5.6; extra == \"socks\"",
        ],
    );
    let mut session = Session::new(&mut cache).with_metadata(&metadata);

    let first = get_dependencies(&r("requests==2.31.0"), &mut session).unwrap();
    let second = get_dependencies(&r("requests==2.31.0"), &mut session).unwrap();
    assert_eq!(first, vec!["charset-normalizer<4,>=2", "idna<4,>=2.5"]);
    assert_eq!(first, second);
    assert_eq!(metadata.calls.get(), 1);
}

#[test]
fn test_failed_build_yields_empty_set_with_diagnostic() {
    let mut cache = DependencyCache::in_memory();
    let builds = BrokenBuilds::default();
    let mut session = Session::new(&mut cache).with_full_resolver(&builds);

    let outcome = try_tier(Tier::FullResolution, &r("legacy==0.1"), &mut session).unwrap();
    assert_eq!(outcome, Outcome::Hit(Vec::new()));
    let failures = session.take_diagnostics();
    assert_eq!(failures.len(), 1);
    assert!(failures[0].message.contains("egg_info failed"));
    assert!(session.diagnostics().is_empty());
}

#[test]
fn test_unknown_release_without_fallback_is_fatal() {
    let mut cache = DependencyCache::in_memory();
    let metadata = CountingMetadata::default();
    let mut session = Session::new(&mut cache).with_metadata(&metadata);
    let err = get_dependencies(&r("ghost==9.9"), &mut session).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<ReqfoldError>(),
        Some(ReqfoldError::DependencyResolution { .. })
    ));
    assert_eq!(metadata.calls.get(), 1);
}
