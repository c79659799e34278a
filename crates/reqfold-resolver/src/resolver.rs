//! Breadth-first traversal driver.
//!
//! Walks the dependency graph level by level: the roots are grouped, each
//! project becomes an abstract dependency, later declarations of an already
//! selected project are merged into it, and the newest surviving candidate
//! is selected. There is no backtracking: a declaration that rules out the
//! selected release is recorded as a conflict.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use petgraph::graph::NodeIndex;
use reqfold_core::requirement::Requirement;

use crate::abstract_dep::AbstractDependency;
use crate::conflict::{ConflictReport, VersionConflict};
use crate::graph::{DepEdge, DependencyGraph, ResolvedNode};
use crate::grouping::group_requirements;
use crate::session::Session;

/// Name of the synthetic node the roots hang from.
pub const ROOT_NAME: &str = "requirements";

pub struct ResolutionResult {
    pub graph: DependencyGraph,
    pub conflicts: ConflictReport,
    /// The selected candidate of every project, keyed by canonical name.
    pub selected: HashMap<String, Requirement>,
}

struct QueueEntry {
    requirement: Requirement,
    depth: usize,
    parent: Option<Arc<Requirement>>,
    parent_node: NodeIndex,
}

struct Selection {
    dependency: AbstractDependency,
    candidate: Requirement,
    node: NodeIndex,
    depth: usize,
}

/// Resolve `roots` and everything they depend on, expanding at most
/// `max_depth` levels below the roots.
pub fn resolve(
    roots: Vec<Requirement>,
    session: &mut Session,
    max_depth: Option<usize>,
) -> miette::Result<ResolutionResult> {
    let mut graph = DependencyGraph::new();
    let mut conflicts = ConflictReport::new();
    let root = graph.add_node(ResolvedNode::new(ROOT_NAME, ""));
    graph.set_root(root);

    let mut queue: VecDeque<QueueEntry> = group_requirements(roots)
        .into_iter()
        .map(|requirement| QueueEntry {
            requirement,
            depth: 1,
            parent: None,
            parent_node: root,
        })
        .collect();
    let mut selections: HashMap<String, Selection> = HashMap::new();

    while let Some(entry) = queue.pop_front() {
        let key = entry.requirement.canonical_name();
        let declared = entry.requirement.to_string();
        let incoming =
            AbstractDependency::from_requirement(entry.requirement, entry.parent.clone(), session)?;

        if let Some(existing) = selections.get_mut(&key) {
            let reason = match existing.dependency.merge(&incoming) {
                Ok(merged) if merged.candidates().contains(&existing.candidate) => {
                    existing.dependency = merged;
                    None
                }
                Ok(_) => Some(format!("already selected at depth {}", existing.depth)),
                Err(e) => Some(e.to_string()),
            };
            match reason {
                Some(reason) => conflicts.add(VersionConflict {
                    package: key,
                    requested: declared,
                    resolved: selected_label(&existing.candidate),
                    reason,
                }),
                None => graph.add_edge(
                    entry.parent_node,
                    existing.node,
                    DepEdge {
                        requirement: declared,
                    },
                ),
            }
            continue;
        }

        let Some(candidate) = incoming.best().cloned() else {
            conflicts.add(VersionConflict {
                package: key,
                requested: declared,
                resolved: "nothing".to_string(),
                reason: "no matching distribution".to_string(),
            });
            continue;
        };

        tracing::debug!("Selected {candidate} for {declared}");
        let node = graph.add_node(ResolvedNode {
            name: candidate.name().to_string(),
            version: candidate.version().map(ToString::to_string).unwrap_or_default(),
            editable: candidate.is_editable(),
        });
        graph.add_edge(
            entry.parent_node,
            node,
            DepEdge {
                requirement: declared,
            },
        );

        if max_depth.map_or(true, |max| entry.depth < max) {
            let parent = Arc::new(candidate.clone());
            for dep in incoming.dependencies_of(&candidate, session)? {
                if !applies_to(&dep, &candidate) {
                    continue;
                }
                queue.push_back(QueueEntry {
                    requirement: dep,
                    depth: entry.depth + 1,
                    parent: Some(Arc::clone(&parent)),
                    parent_node: node,
                });
            }
        }

        selections.insert(
            key,
            Selection {
                dependency: incoming,
                candidate,
                node,
                depth: entry.depth,
            },
        );
    }

    let selected = selections
        .into_iter()
        .map(|(key, s)| (key, s.candidate))
        .collect();
    Ok(ResolutionResult {
        graph,
        conflicts,
        selected,
    })
}

/// Dependencies gated on an extra only apply when the candidate asked for it.
fn applies_to(dep: &Requirement, candidate: &Requirement) -> bool {
    let extras = dep.markers().map(|m| m.extra_names()).unwrap_or_default();
    extras.is_empty() || extras.iter().any(|e| candidate.extras().contains(e))
}

fn selected_label(candidate: &Requirement) -> String {
    match candidate.version() {
        Some(version) => version.to_string(),
        None => candidate.to_string(),
    }
}
