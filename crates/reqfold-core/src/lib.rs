//! Core data types for reqfold.
//!
//! This crate defines the values the resolution engine works with:
//! PEP 440 versions and specifier sets, environment markers, requirement
//! lines, index candidates and artifact links, plus user configuration.
//!
//! This crate is intentionally free of network I/O.

pub mod candidate;
pub mod config;
pub mod link;
pub mod marker;
pub mod requirement;
pub mod specifier;
pub mod version;
