//! Abstract dependency resolution engine: candidate resolution, constraint
//! grouping and merging, the tiered dependency lookup pipeline, and the
//! persistent dependency cache that backs it.

pub mod abstract_dep;
pub mod cache;
pub mod conflict;
pub mod finder;
pub mod graph;
pub mod grouping;
pub mod pipeline;
pub mod provider;
pub mod resolver;
pub mod session;

#[cfg(test)]
mod testing;
