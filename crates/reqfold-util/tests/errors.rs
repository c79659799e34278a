use reqfold_util::errors::ReqfoldError;

#[test]
fn test_io_error_display() {
    let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file missing");
    let err = ReqfoldError::from(io_err);
    assert!(err.to_string().contains("I/O error"), "got: {err}");
}

#[test]
fn test_invalid_requirement_display() {
    let err = ReqfoldError::InvalidRequirement {
        line: "foo>>1".to_string(),
        message: "unknown operator".to_string(),
    };
    assert_eq!(
        err.to_string(),
        "Invalid requirement 'foo>>1': unknown operator"
    );
}

#[test]
fn test_empty_intersection_display() {
    let err = ReqfoldError::EmptyIntersection {
        name: "six".to_string(),
        left: "six<1.10".to_string(),
        right: "six>=1.12".to_string(),
    };
    let msg = err.to_string();
    assert!(msg.starts_with("Conflicting requirements for six"), "got: {msg}");
    assert!(msg.contains("'six<1.10'"));
    assert!(msg.contains("'six>=1.12'"));
}

#[test]
fn test_dependency_resolution_display() {
    let err = ReqfoldError::DependencyResolution {
        requirement: "foo==1.0".to_string(),
    };
    assert_eq!(err.to_string(), "Failed to get dependencies for foo==1.0");
}

#[test]
fn test_network_error_display() {
    let err = ReqfoldError::Network {
        message: "timeout".to_string(),
    };
    assert_eq!(err.to_string(), "Network error: timeout");
}

#[test]
fn test_generic_error_display() {
    let err = ReqfoldError::Generic {
        message: "something broke".to_string(),
    };
    assert_eq!(err.to_string(), "something broke");
}

#[test]
fn test_error_survives_miette_report() {
    let report: miette::Report = ReqfoldError::Cache {
        message: "corrupt".to_string(),
    }
    .into();
    assert!(matches!(
        report.downcast_ref::<ReqfoldError>(),
        Some(ReqfoldError::Cache { .. })
    ));
}
