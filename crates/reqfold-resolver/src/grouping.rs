//! Constraint grouping: fold repeated declarations of a project into one.

use std::collections::HashMap;

use reqfold_core::marker::Marker;
use reqfold_core::requirement::Requirement;

/// One requirement per project, in the order projects were first seen.
///
/// An editable declaration stands alone and the others for that project
/// are dropped. Otherwise the group folds left to right: specifiers are
/// intersected, markers AND-ed, extras unioned, and the result is only a
/// constraint if every declaration was one. Purely in-memory.
pub fn group_requirements(requirements: impl IntoIterator<Item = Requirement>) -> Vec<Requirement> {
    let mut order: Vec<String> = Vec::new();
    let mut groups: HashMap<String, Vec<Requirement>> = HashMap::new();
    for requirement in requirements {
        let name = requirement.canonical_name();
        groups
            .entry(name.clone())
            .or_insert_with(|| {
                order.push(name);
                Vec::new()
            })
            .push(requirement);
    }

    order
        .into_iter()
        .filter_map(|name| groups.remove(&name))
        .filter_map(fold_group)
        .collect()
}

fn fold_group(group: Vec<Requirement>) -> Option<Requirement> {
    if let Some(editable) = group.iter().find(|r| r.is_editable()) {
        return Some(editable.clone());
    }
    let mut declarations = group.into_iter();
    let first = declarations.next()?;
    Some(declarations.fold(first, combine))
}

fn combine(acc: Requirement, next: Requirement) -> Requirement {
    let specifier = acc.specifier().intersect(next.specifier());
    let markers = Marker::and_opt(acc.markers().cloned(), next.markers().cloned());
    let extras: Vec<String> = acc.extras().union(next.extras()).cloned().collect();
    let constraint = acc.is_constraint() && next.is_constraint();
    let link = acc.link().or(next.link()).cloned();
    acc.with_specifier(specifier)
        .with_markers(markers)
        .with_extras(extras)
        .with_constraint(constraint)
        .with_link(link)
}
