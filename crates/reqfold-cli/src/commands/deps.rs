//! Handler for `reqfold deps`.

use miette::Result;

use reqfold_core::requirement::Requirement;
use reqfold_resolver::abstract_dep::AbstractDependency;
use reqfold_resolver::pipeline::get_dependencies;
use reqfold_util::errors::ReqfoldError;
use reqfold_util::progress;

use super::context::Context;

/// Print the dependency lines of `line`. A ranged requirement is narrowed
/// to its newest matching release first.
pub fn exec(ctx: &mut Context, line: &str) -> Result<()> {
    let requirement = Requirement::parse(line)?;
    let mut session = ctx.session(false);

    let candidate = if requirement.is_pinned() || requirement.is_editable() {
        requirement
    } else {
        let dependency = AbstractDependency::from_requirement(requirement, None, &session)?;
        match dependency.best() {
            Some(best) => best.clone(),
            None => {
                return Err(ReqfoldError::DependencyResolution {
                    requirement: dependency.requirement().to_string(),
                }
                .into())
            }
        }
    };

    let deps = get_dependencies(&candidate, &mut session)?;
    for failure in session.take_diagnostics() {
        progress::status_warn("Warning", &failure.to_string());
    }
    tracing::debug!("{candidate}: {} dependencies", deps.len());
    for dep in deps {
        println!("{dep}");
    }
    Ok(())
}
