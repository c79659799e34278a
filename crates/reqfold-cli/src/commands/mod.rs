//! Command dispatch and handler modules.

mod cache;
mod candidates;
mod context;
mod deps;
mod group;
mod tree;

use miette::Result;

use crate::cli::{Cli, Command};
use context::Context;

/// Route a parsed CLI invocation to the appropriate command handler.
pub fn dispatch(cli: Cli) -> Result<()> {
    let mut ctx = Context::load(cli.config.as_deref(), cli.index_url.as_deref(), cli.offline)?;
    match cli.command {
        Command::Candidates { requirement, pre } => candidates::exec(&mut ctx, &requirement, pre),
        Command::Deps { requirement } => deps::exec(&mut ctx, &requirement),
        Command::Group { requirements } => group::exec(&requirements),
        Command::Tree {
            requirements,
            depth,
            pre,
            why,
            invert,
            conflicts,
        } => tree::exec(
            &mut ctx,
            &requirements,
            &tree::TreeOptions {
                depth,
                pre,
                why,
                invert,
                conflicts,
            },
        ),
        Command::Cache { action } => cache::exec(&ctx, action),
    }
}
