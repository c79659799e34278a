//! Handler for `reqfold candidates`.

use miette::Result;

use reqfold_core::requirement::Requirement;
use reqfold_resolver::finder::{best_per_version, find_all_matches};
use reqfold_util::progress;

use super::context::Context;

pub fn exec(ctx: &mut Context, line: &str, pre: bool) -> Result<()> {
    let requirement = Requirement::parse(line)?;
    let allow = pre || ctx.config.resolver.allow_prereleases;

    let spinner = progress::spinner(&format!("Querying {}", requirement.name()));
    let found = find_all_matches(ctx.index()?, &requirement, allow);
    spinner.finish_and_clear();

    let matches = best_per_version(found?);
    if matches.is_empty() {
        progress::status_warn("Warning", &format!("no distribution matches {requirement}"));
        return Ok(());
    }
    for candidate in &matches {
        match &candidate.link {
            Some(link) => println!("{}=={}  {}", candidate.name, candidate.version, link.filename()),
            None => println!("{}=={}", candidate.name, candidate.version),
        }
    }
    Ok(())
}
