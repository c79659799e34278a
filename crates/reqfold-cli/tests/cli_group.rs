use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn reqfold_cmd(tmp: &TempDir) -> Command {
    #[allow(deprecated)]
    let mut cmd = Command::cargo_bin("reqfold").unwrap();
    cmd.env("REQFOLD_CACHE_DIR", tmp.path().join("cache"))
        .env_remove("RUST_LOG")
        .args(["--offline", "--config"])
        .arg(tmp.path().join("config.toml"));
    cmd
}

#[test]
fn test_group_folds_repeated_declarations() {
    let tmp = TempDir::new().unwrap();
    reqfold_cmd(&tmp)
        .args(["group", "pkg>=1,<3", "other", "pkg>=2"])
        .assert()
        .success()
        .stdout("pkg<3,>=1,>=2\nother\n");
}

#[test]
fn test_group_editable_wins() {
    let tmp = TempDir::new().unwrap();
    reqfold_cmd(&tmp)
        .args(["group", "pkg==1.0", "--", "-e file:///src/pkg#egg=pkg"])
        .assert()
        .success()
        .stdout("-e file:///src/pkg#egg=pkg\n");
}

#[test]
fn test_group_rejects_invalid_requirement() {
    let tmp = TempDir::new().unwrap();
    reqfold_cmd(&tmp)
        .args(["group", "pkg>=>1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid"));
}

#[test]
fn test_group_requires_arguments() {
    let tmp = TempDir::new().unwrap();
    reqfold_cmd(&tmp).args(["group"]).assert().failure();
}

#[test]
fn test_candidates_need_the_index() {
    let tmp = TempDir::new().unwrap();
    reqfold_cmd(&tmp)
        .args(["candidates", "requests>=2"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("offline"));
}
