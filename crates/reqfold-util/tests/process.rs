use reqfold_util::process::CommandBuilder;

#[cfg(unix)]
#[test]
fn test_builder_simple_command() {
    let output = CommandBuilder::new("echo").arg("hello").exec().unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(stdout.trim(), "hello");
}

#[cfg(unix)]
#[test]
fn test_builder_with_env_and_cwd() {
    let tmp = tempfile::TempDir::new().unwrap();
    std::fs::write(tmp.path().join("setup.py"), "").unwrap();
    let output = CommandBuilder::new("sh")
        .args(["-c", "ls setup.py && echo $REQFOLD_TEST_VAR"])
        .env("REQFOLD_TEST_VAR", "value")
        .cwd(tmp.path())
        .exec()
        .unwrap();
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("setup.py"));
    assert!(stdout.contains("value"));
}

#[cfg(unix)]
#[test]
fn test_exec_checked_reports_failure() {
    let err = CommandBuilder::new("sh")
        .args(["-c", "echo boom >&2; exit 3"])
        .exec_checked()
        .unwrap_err();
    let msg = err.to_string();
    assert!(msg.contains("boom"), "got: {msg}");
}

#[test]
fn test_missing_program_is_io_error() {
    let err = CommandBuilder::new("reqfold-definitely-missing-binary")
        .exec()
        .unwrap_err();
    assert!(err.to_string().contains("I/O error"));
}
