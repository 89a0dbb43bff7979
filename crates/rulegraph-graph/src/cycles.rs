//! Dependency cycle report.
//!
//! Cycles are reported, never broken: the layout ignores them and the render
//! adapter only flags the edges involved.

use crate::graph::RuleGraph;
use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::{HashMap, HashSet};

fn to_digraph(graph: &RuleGraph) -> (DiGraph<&str, ()>, HashMap<&str, NodeIndex>) {
    let mut digraph = DiGraph::new();
    let mut index = HashMap::with_capacity(graph.node_count());
    for node in graph.nodes() {
        index.insert(node.id.as_str(), digraph.add_node(node.id.as_str()));
    }
    for node in graph.nodes() {
        let target = index[node.id.as_str()];
        for dep in node.dependency_ids() {
            if let Some(&source) = index.get(dep) {
                digraph.add_edge(source, target, ());
            }
        }
    }
    (digraph, index)
}

/// Groups of rules that (transitively) depend on each other.
///
/// Each group is sorted by id and the list of groups is sorted, so the
/// report is stable across runs.
pub fn find_cycles(graph: &RuleGraph) -> Vec<Vec<String>> {
    let (digraph, _) = to_digraph(graph);
    let mut cycles: Vec<Vec<String>> = tarjan_scc(&digraph)
        .into_iter()
        .filter(|component| component.len() > 1)
        .map(|component| {
            let mut ids: Vec<String> = component
                .into_iter()
                .map(|idx| digraph[idx].to_string())
                .collect();
            ids.sort();
            ids
        })
        .collect();
    cycles.sort();
    if !cycles.is_empty() {
        tracing::debug!("Found {} dependency cycle(s)", cycles.len());
    }
    cycles
}

/// Set of `(source, target)` edges that lie on some cycle.
pub fn cycle_edges(graph: &RuleGraph, cycles: &[Vec<String>]) -> HashSet<(String, String)> {
    let component_of: HashMap<&str, usize> = cycles
        .iter()
        .enumerate()
        .flat_map(|(idx, ids)| ids.iter().map(move |id| (id.as_str(), idx)))
        .collect();

    graph
        .edges()
        .into_iter()
        .filter(|edge| {
            match (
                component_of.get(edge.source.as_str()),
                component_of.get(edge.target.as_str()),
            ) {
                (Some(a), Some(b)) => a == b,
                _ => false,
            }
        })
        .map(|edge| (edge.source, edge.target))
        .collect()
}
