//! Handler for `reqfold tree`.

use miette::Result;

use reqfold_core::requirement::Requirement;
use reqfold_resolver::resolver::resolve;
use reqfold_util::progress;

use super::context::Context;

/// Options for `reqfold tree`.
pub struct TreeOptions {
    pub depth: Option<usize>,
    pub pre: bool,
    pub why: Option<String>,
    pub invert: Option<String>,
    pub conflicts: bool,
}

pub fn exec(ctx: &mut Context, lines: &[String], opts: &TreeOptions) -> Result<()> {
    let roots = lines
        .iter()
        .map(|line| Requirement::parse(line))
        .collect::<Result<Vec<_>, _>>()?;

    let mut session = ctx.session(opts.pre);
    let spinner = progress::spinner("Resolving dependencies");
    let result = resolve(roots, &mut session, opts.depth);
    spinner.finish_and_clear();
    let result = result?;

    for failure in session.take_diagnostics() {
        progress::status_warn("Warning", &failure.to_string());
    }

    if opts.conflicts {
        println!("{}", result.conflicts.to_string().trim_end());
        return Ok(());
    }

    if let Some(name) = &opts.why {
        match result.graph.find_path(name) {
            Some(path) => {
                let chain: Vec<String> = path.iter().map(ToString::to_string).collect();
                println!("{}", chain.join(" -> "));
            }
            None => println!("{name} is not in the dependency tree"),
        }
        return Ok(());
    }

    if let Some(name) = &opts.invert {
        let inverted = result.graph.print_inverted_tree(name);
        if inverted.is_empty() {
            println!("{name} is not in the dependency tree");
        } else {
            print!("{inverted}");
        }
        return Ok(());
    }

    print!("{}", result.graph.print_tree(None));
    for conflict in &result.conflicts.conflicts {
        progress::status_warn("Conflict", &conflict.to_string());
    }
    Ok(())
}
