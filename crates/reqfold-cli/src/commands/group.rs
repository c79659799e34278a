//! Handler for `reqfold group`.

use miette::Result;

use reqfold_core::requirement::Requirement;
use reqfold_resolver::grouping::group_requirements;

pub fn exec(lines: &[String]) -> Result<()> {
    let requirements = lines
        .iter()
        .map(|line| Requirement::parse(line))
        .collect::<Result<Vec<_>, _>>()?;
    for requirement in group_requirements(requirements) {
        println!("{requirement}");
    }
    Ok(())
}
