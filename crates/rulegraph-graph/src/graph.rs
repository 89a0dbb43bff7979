use crate::extractor::extract_references;
use rulegraph_core::{Rule, normalize_group_name};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::ops::Index;

/// Where a dependency came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DependencyOrigin {
    /// Declared in the rule's `dependsOn` list.
    Explicit,
    /// Found by scanning the rule's expression.
    Inferred,
    /// Declared and also found in the expression.
    Both,
}

impl DependencyOrigin {
    fn merge(self, other: DependencyOrigin) -> DependencyOrigin {
        if self == other { self } else { DependencyOrigin::Both }
    }

    pub fn is_declared(self) -> bool {
        matches!(self, DependencyOrigin::Explicit | DependencyOrigin::Both)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dependency {
    pub id: String,
    pub origin: DependencyOrigin,
}

/// A rule as seen by the layout: its name, normalized group and the other
/// rules it reads. Positions live in the layout result, never here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    pub group: String,
    /// Sorted by id, no duplicates, never contains `id` itself.
    pub dependencies: Vec<Dependency>,
}

impl Node {
    pub fn dependency_ids(&self) -> impl Iterator<Item = &str> {
        self.dependencies.iter().map(|dep| dep.id.as_str())
    }

    pub fn depends_on(&self, id: &str) -> bool {
        self.dependencies
            .binary_search_by(|dep| dep.id.as_str().cmp(id))
            .is_ok()
    }
}

/// Build one node per distinct rule target.
///
/// Explicit dependencies are kept only when they name a known rule; inferred
/// ones come from [`extract_references`]. Output follows input order.
pub fn build_nodes(rules: &[Rule]) -> Vec<Node> {
    let known: HashSet<String> = rules.iter().map(|rule| rule.target.clone()).collect();
    let mut seen = HashSet::with_capacity(rules.len());
    let mut nodes = Vec::with_capacity(rules.len());

    for rule in rules {
        if !seen.insert(rule.target.as_str()) {
            tracing::warn!(
                "Duplicate rule target {:?}; keeping the first definition",
                rule.target
            );
            continue;
        }
        nodes.push(build_node(rule, &known));
    }

    nodes
}

fn build_node(rule: &Rule, known: &HashSet<String>) -> Node {
    let mut origins: BTreeMap<String, DependencyOrigin> = BTreeMap::new();

    for dep in &rule.depends_on {
        let dep = dep.trim();
        if dep == rule.target {
            continue;
        }
        if !known.contains(dep) {
            tracing::debug!(
                "Rule {:?} declares unknown dependency {:?}; dropping it",
                rule.target,
                dep
            );
            continue;
        }
        origins.insert(dep.to_string(), DependencyOrigin::Explicit);
    }

    for dep in extract_references(&rule.expression, known, &rule.target) {
        origins
            .entry(dep)
            .and_modify(|origin| *origin = origin.merge(DependencyOrigin::Inferred))
            .or_insert(DependencyOrigin::Inferred);
    }

    Node {
        id: rule.target.clone(),
        group: normalize_group_name(rule.group()),
        dependencies: origins
            .into_iter()
            .map(|(id, origin)| Dependency { id, origin })
            .collect(),
    }
}

/// A resolved dependency edge, drawn from `source` (the dependency) to
/// `target` (the dependent rule).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct GraphEdge {
    pub source: String,
    pub target: String,
}

/// Node set with id lookup.
#[derive(Debug, Clone, Default)]
pub struct RuleGraph {
    nodes: Vec<Node>,
    node_map: HashMap<String, usize>,
}

impl RuleGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_rules(rules: &[Rule]) -> Self {
        Self::from_nodes(build_nodes(rules))
    }

    pub fn from_nodes(nodes: Vec<Node>) -> Self {
        let mut graph = Self::new();
        for node in nodes {
            graph.add_node(node);
        }
        graph
    }

    /// Adds `node` unless a node with the same id is already present.
    pub fn add_node(&mut self, node: Node) -> bool {
        if self.node_map.contains_key(&node.id) {
            return false;
        }
        self.node_map.insert(node.id.clone(), self.nodes.len());
        self.nodes.push(node);
        true
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.node_map.contains_key(id)
    }

    pub fn get(&self, id: &str) -> Option<&Node> {
        self.node_map.get(id).map(|&idx| &self.nodes[idx])
    }

    /// Edges whose both endpoints are present, sorted.
    ///
    /// Dependencies that name a missing node are skipped; this happens when
    /// nodes were assembled by hand rather than through [`build_nodes`].
    pub fn edges(&self) -> Vec<GraphEdge> {
        let mut edges = Vec::new();
        for node in &self.nodes {
            for dep in node.dependency_ids() {
                if !self.contains(dep) {
                    tracing::debug!(
                        "Dropping edge {:?} -> {:?}: dependency is not in the graph",
                        dep,
                        node.id
                    );
                    continue;
                }
                edges.push(GraphEdge {
                    source: dep.to_string(),
                    target: node.id.clone(),
                });
            }
        }
        edges.sort();
        edges
    }

    pub fn edge_count(&self) -> usize {
        self.edges().len()
    }

    /// Ids of the rules that read `id`, sorted.
    pub fn dependents_of(&self, id: &str) -> Vec<String> {
        let dependents: BTreeSet<&str> = self
            .nodes
            .iter()
            .filter(|node| node.depends_on(id))
            .map(|node| node.id.as_str())
            .collect();
        dependents.into_iter().map(str::to_string).collect()
    }
}

impl Index<&str> for RuleGraph {
    type Output = Node;
    fn index(&self, id: &str) -> &Self::Output {
        &self.nodes[self.node_map[id]]
    }
}
