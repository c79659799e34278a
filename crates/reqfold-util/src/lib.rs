//! Shared utilities for reqfold.
//!
//! This crate provides cross-cutting concerns used by all other reqfold crates:
//! error types, filesystem helpers, hashing, process spawning,
//! and terminal progress indicators.

pub mod errors;
pub mod fs;
pub mod hash;
pub mod process;
pub mod progress;
