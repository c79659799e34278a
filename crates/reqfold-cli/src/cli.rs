//! CLI argument definitions for reqfold.
//!
//! Each command corresponds to a handler in the [`super::commands`] module.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "reqfold",
    version,
    about = "Resolve Python requirements into candidate sets and dependency trees",
    long_about = "reqfold folds repeated requirement declarations together, finds the \
                  releases each one admits, and looks up their dependencies through a \
                  cache-first pipeline."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Never touch the network; only the dependency cache answers
    #[arg(long, global = true)]
    pub offline: bool,

    /// Package index to use instead of the configured one
    #[arg(long, global = true, env = "REQFOLD_INDEX_URL")]
    pub index_url: Option<String>,

    /// Configuration file (default: ~/.reqfold/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List the releases a requirement admits
    Candidates {
        /// Requirement line, e.g. "requests>=2,<3"
        requirement: String,
        /// Consider pre-releases
        #[arg(long)]
        pre: bool,
    },

    /// Show the dependencies of a pinned requirement
    Deps {
        /// Pinned requirement, e.g. "requests==2.31.0"
        requirement: String,
    },

    /// Fold repeated declarations into one requirement per project
    Group {
        /// Requirement lines
        #[arg(required = true)]
        requirements: Vec<String>,
    },

    /// Resolve and print the dependency tree
    Tree {
        /// Requirement lines
        #[arg(required = true)]
        requirements: Vec<String>,
        /// Maximum depth
        #[arg(long)]
        depth: Option<usize>,
        /// Consider pre-releases
        #[arg(long)]
        pre: bool,
        /// Explain why a project is included
        #[arg(long)]
        why: Option<String>,
        /// Show what depends on a project
        #[arg(long)]
        invert: Option<String>,
        /// Only report version conflicts
        #[arg(long)]
        conflicts: bool,
    },

    /// Inspect the dependency cache
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum CacheAction {
    /// Print the cache file location
    Path,
    /// List cached dependency entries
    List,
    /// Remove every cached entry and downloaded wheel
    Clear,
}

pub fn parse() -> Cli {
    Cli::parse()
}
