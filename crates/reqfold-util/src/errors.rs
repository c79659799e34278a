use miette::Diagnostic;
use thiserror::Error;

/// Unified error type for all reqfold operations.
#[derive(Debug, Error, Diagnostic)]
pub enum ReqfoldError {
    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A version string does not follow PEP 440.
    #[error("Invalid version '{version}': {message}")]
    InvalidVersion { version: String, message: String },

    /// A requirement line could not be parsed.
    #[error("Invalid requirement '{line}': {message}")]
    #[diagnostic(help("Requirements look like `name[extra]>=1.0,<2; python_version >= \"3.8\"`"))]
    InvalidRequirement { line: String, message: String },

    /// Two declarations of the same package share no candidate version.
    #[error("Conflicting requirements for {name}: '{left}' and '{right}' have no version in common")]
    EmptyIntersection {
        name: String,
        left: String,
        right: String,
    },

    /// Every dependency lookup strategy was exhausted for a candidate.
    #[error("Failed to get dependencies for {requirement}")]
    #[diagnostic(help("Check the package index is reachable or drop --offline"))]
    DependencyResolution { requirement: String },

    /// Network request or download failed.
    #[error("Network error: {message}")]
    Network { message: String },

    /// Package metadata was missing or malformed.
    #[error("Metadata error: {message}")]
    Metadata { message: String },

    /// The persistent dependency cache could not be read or written.
    #[error("Cache error: {message}")]
    Cache { message: String },

    /// Invalid or unreadable configuration.
    #[error("Config error: {message}")]
    #[diagnostic(help("Check ~/.reqfold/config.toml for syntax errors"))]
    Config { message: String },

    /// Catch-all for miscellaneous errors.
    #[error("{message}")]
    Generic { message: String },
}

/// Convenience alias for `miette::Result<T>`.
pub type ReqfoldResult<T> = miette::Result<T>;
