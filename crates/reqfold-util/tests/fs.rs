use reqfold_util::fs::{ensure_dir, expand_home, find_files, home_dir, write_atomic};
use tempfile::TempDir;

#[test]
fn test_ensure_dir_creates_nested() {
    let tmp = TempDir::new().unwrap();
    let deep = tmp.path().join("x").join("y").join("z");
    assert!(!deep.exists());
    ensure_dir(&deep).unwrap();
    assert!(deep.is_dir());
}

#[test]
fn test_ensure_dir_idempotent() {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path().join("already");
    std::fs::create_dir(&dir).unwrap();
    ensure_dir(&dir).unwrap();
    assert!(dir.is_dir());
}

#[test]
fn test_write_atomic_creates_parents_and_replaces() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("nested").join("depcache.json");
    write_atomic(&path, b"first").unwrap();
    assert_eq!(std::fs::read(&path).unwrap(), b"first");
    write_atomic(&path, b"second").unwrap();
    assert_eq!(std::fs::read(&path).unwrap(), b"second");
}

#[test]
fn test_expand_home() {
    let expanded = expand_home("~/.reqfold/cache");
    assert_eq!(expanded, home_dir().join(".reqfold/cache"));
    assert_eq!(
        expand_home("/abs/path"),
        std::path::PathBuf::from("/abs/path")
    );
}

#[test]
fn test_find_files_recurses() {
    let tmp = TempDir::new().unwrap();
    let nested = tmp.path().join("a").join("b");
    std::fs::create_dir_all(&nested).unwrap();
    std::fs::write(nested.join("pkg-1.0-py3-none-any.whl"), "").unwrap();
    std::fs::write(tmp.path().join("notes.txt"), "").unwrap();
    let wheels = find_files(tmp.path(), &|name: &str| name.ends_with(".whl"));
    assert_eq!(wheels.len(), 1);
    assert!(wheels[0].ends_with("pkg-1.0-py3-none-any.whl"));
}
