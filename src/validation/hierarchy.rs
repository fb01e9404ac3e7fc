//! Parent/child hierarchy validation
//!
//! Domains nest under domains, glossary nodes under glossary nodes and
//! glossary terms under glossary nodes. A parent reference may name a row by
//! `datahub_id`, URN or name. A reference that is a well-formed URN but not
//! present locally is assumed to exist remotely.

use super::ValidationError;
use crate::models::{Domain, Entity, GlossaryNode, GlossaryTerm};
use crate::urn::Urn;
use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};

/// Index of the row a parent reference points at
fn find_parent<E: Entity>(reference: &str, rows: &[E]) -> Option<usize> {
    let reference = reference.trim();
    rows.iter()
        .position(|r| r.meta().effective_datahub_id() == Some(reference))
        .or_else(|| {
            rows.iter()
                .position(|r| r.meta().urn.as_ref().map(Urn::as_str) == Some(reference))
        })
        .or_else(|| rows.iter().position(|r| r.name().trim() == reference))
}

fn is_remote_reference(reference: &str) -> bool {
    Urn::parse(reference).is_ok()
}

/// Unknown parents and cycles among rows of a self-nesting entity type
fn validate_self_hierarchy<E: Entity>(
    rows: &[E],
    parent_of: impl Fn(&E) -> Option<&str>,
) -> Vec<ValidationError> {
    let entity_type = E::ENTITY_TYPE.as_str();
    let mut errors = Vec::new();

    // Edges point from child to parent
    let mut graph = DiGraph::<usize, ()>::new();
    let nodes: Vec<NodeIndex> = (0..rows.len()).map(|i| graph.add_node(i)).collect();

    for (idx, row) in rows.iter().enumerate() {
        let Some(reference) = parent_of(row).filter(|p| !p.trim().is_empty()) else {
            continue;
        };
        match find_parent(reference, rows) {
            Some(parent) => {
                graph.add_edge(nodes[idx], nodes[parent], ());
            }
            None if is_remote_reference(reference) => {}
            None => errors.push(ValidationError::UnknownParent {
                entity_type,
                name: row.name().to_string(),
                parent: reference.to_string(),
            }),
        }
    }

    for component in tarjan_scc(&graph) {
        let is_cycle = component.len() > 1
            || component
                .first()
                .is_some_and(|&n| graph.find_edge(n, n).is_some());
        if !is_cycle {
            continue;
        }
        let mut members: Vec<usize> = component.iter().map(|&n| graph[n]).collect();
        members.sort_unstable();
        let path = cycle_path(&graph, &nodes, members[0], rows);
        errors.push(ValidationError::HierarchyCycle { entity_type, path });
    }

    errors
}

/// Names along the cycle starting at `start`, ending with `start` again
fn cycle_path<E: Entity>(
    graph: &DiGraph<usize, ()>,
    nodes: &[NodeIndex],
    start: usize,
    rows: &[E],
) -> Vec<String> {
    let mut path = vec![rows[start].name().to_string()];
    let mut current = nodes[start];
    // Each row has at most one parent edge, so following it walks the cycle
    for _ in 0..rows.len() {
        let Some(next) = graph.neighbors(current).next() else {
            break;
        };
        path.push(rows[graph[next]].name().to_string());
        if graph[next] == start {
            break;
        }
        current = next;
    }
    path
}

/// Unknown parents and parent cycles among domains
pub fn validate_domain_hierarchy(domains: &[Domain]) -> Vec<ValidationError> {
    validate_self_hierarchy(domains, |d| d.parent.as_deref())
}

/// Node hierarchy problems plus terms whose parent node does not exist
pub fn validate_glossary_hierarchy(
    nodes: &[GlossaryNode],
    terms: &[GlossaryTerm],
) -> Vec<ValidationError> {
    let mut errors = validate_self_hierarchy(nodes, |n| n.parent.as_deref());
    for term in terms {
        let Some(reference) = term.parent.as_deref().filter(|p| !p.trim().is_empty()) else {
            continue;
        };
        if find_parent(reference, nodes).is_none() && !is_remote_reference(reference) {
            errors.push(ValidationError::UnknownParent {
                entity_type: GlossaryTerm::ENTITY_TYPE.as_str(),
                name: term.name.clone(),
                parent: reference.to_string(),
            });
        }
    }
    errors
}
