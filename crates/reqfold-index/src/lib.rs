//! Python package index protocol: PEP 691 project pages, the JSON release
//! API, a local wheel cache, core-metadata parsing, source-tree metadata
//! extraction, and single-requirement resolution from artifacts.

pub mod artifact_cache;
pub mod auth;
pub mod dist;
pub mod download;
pub mod json_api;
pub mod metadata;
pub mod repository;
pub mod setup_info;
pub mod simple;
pub mod source;
pub mod unpack;
