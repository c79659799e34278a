use reqfold_core::config::{dirs_path, ResolverConfig};

#[test]
fn test_default_index_is_pypi() {
    let config = ResolverConfig::default();
    assert_eq!(config.index.url, "https://pypi.org/simple");
    assert_eq!(config.index.json_url, "https://pypi.org/pypi");
    assert!(config.index.username.is_none());
}

#[test]
fn test_default_resolver_settings() {
    let config = ResolverConfig::default();
    assert!(!config.resolver.allow_prereleases);
    assert!(config.resolver.use_json_api);
    assert_eq!(config.resolver.python, "python3");
    assert_eq!(config.resolver.timeout_secs, 60);
}

#[test]
fn test_empty_toml_uses_serde_defaults() {
    let config: ResolverConfig = toml::from_str("").unwrap();
    assert!(config.resolver.use_json_api);
    assert_eq!(config.cache.dir, "~/.reqfold/cache");
}

#[test]
fn test_partial_toml() {
    let config: ResolverConfig = toml::from_str(
        r#"
[index]
url = "https://mirror.example/simple"
username = "ci"

[resolver]
allow-prereleases = true
use-json-api = false
"#,
    )
    .unwrap();
    assert_eq!(config.index.url, "https://mirror.example/simple");
    assert_eq!(config.index.json_url, "https://pypi.org/pypi");
    assert_eq!(config.index.username.as_deref(), Some("ci"));
    assert!(config.resolver.allow_prereleases);
    assert!(!config.resolver.use_json_api);
}

#[test]
fn test_load_from_missing_file_is_default() {
    let tmp = tempfile::tempdir().unwrap();
    let config = ResolverConfig::load_from(&tmp.path().join("nope.toml")).unwrap();
    assert_eq!(config.resolver.timeout_secs, 60);
}

#[test]
fn test_load_from_file() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("config.toml");
    std::fs::write(&path, "[cache]\ndir = \"/var/cache/reqfold\"\n").unwrap();
    let config = ResolverConfig::load_from(&path).unwrap();
    assert_eq!(config.cache.dir, "/var/cache/reqfold");
}

#[test]
fn test_load_from_malformed_file_errors() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("config.toml");
    std::fs::write(&path, "[resolver\n").unwrap();
    let err = ResolverConfig::load_from(&path).unwrap_err();
    assert!(err.to_string().contains("Config error"));
}

#[test]
fn test_dirs_path_contains_reqfold() {
    assert!(dirs_path().ends_with(".reqfold"));
}
