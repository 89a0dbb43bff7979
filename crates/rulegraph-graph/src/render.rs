//! Drawing-surface view of a laid-out rule graph.
//!
//! Everything here is derived from the graph, the layout and the group
//! catalog; nothing feeds back into the layout.

use crate::cycles::{cycle_edges, find_cycles};
use crate::graph::{DependencyOrigin, RuleGraph};
use crate::layout::{LayerKey, PyramidLayout, Vec2};
use crate::style::{Color, EdgeStyle, get_edge_style, group_color};
use chrono::NaiveDate;
use rulegraph_core::{GroupCatalog, LayoutConfig, Rule, UNGROUPED};
use serde::{Deserialize, Serialize};

const UNGROUPED_LABEL: &str = "Ungrouped";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderNode {
    pub id: String,
    pub label: String,
    pub group: String,
    pub color: Color,
    /// Box center.
    pub position: Vec2,
    pub size: Vec2,
    pub dependencies: Vec<String>,
}

/// One arrow from a dependency's bottom-center to its dependent's top-center.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderEdge {
    pub source: String,
    pub target: String,
    pub origin: DependencyOrigin,
    pub from: Vec2,
    pub to: Vec2,
    pub in_cycle: bool,
    pub style: EdgeStyle,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderLayer {
    pub key: LayerKey,
    pub group: String,
    pub display_name: String,
    pub color: Color,
    /// Caption position: above the topmost row of the band.
    pub label_anchor: Vec2,
    /// Dashed separator from the left edge of the widest row to `label_anchor.x`.
    pub separator_from: Vec2,
    pub separator_to: Vec2,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComponentsGraphView {
    pub nodes: Vec<RenderNode>,
    pub edges: Vec<RenderEdge>,
    pub layers: Vec<RenderLayer>,
    /// Groups of mutually dependent rules; rendered as-is.
    pub cycles: Vec<Vec<String>>,
}

impl ComponentsGraphView {
    pub fn node(&self, id: &str) -> Option<&RenderNode> {
        self.nodes.iter().find(|node| node.id == id)
    }

    pub fn has_edge(&self, source: &str, target: &str) -> bool {
        self.edges
            .iter()
            .any(|edge| edge.source == source && edge.target == target)
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// What the detail panel shows for a selected node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleDetails {
    pub target: String,
    pub expression: String,
    pub depends_on: Vec<String>,
    pub group: Option<String>,
    pub effective_from: Option<NaiveDate>,
    pub effective_to: Option<NaiveDate>,
    /// Rules that read this one, sorted.
    pub used_by: Vec<String>,
}

pub struct RenderAdapter<'a> {
    graph: &'a RuleGraph,
    layout: &'a PyramidLayout,
    catalog: &'a GroupCatalog,
    config: &'a LayoutConfig,
}

impl<'a> RenderAdapter<'a> {
    pub fn new(
        graph: &'a RuleGraph,
        layout: &'a PyramidLayout,
        catalog: &'a GroupCatalog,
        config: &'a LayoutConfig,
    ) -> Self {
        Self {
            graph,
            layout,
            catalog,
            config,
        }
    }

    fn color_for(&self, group: &str) -> Color {
        if group == UNGROUPED {
            return group_color(None);
        }
        group_color(self.catalog.find(group).map(|g| g.color.as_str()))
    }

    fn bottom_center(&self, pos: Vec2) -> Vec2 {
        Vec2::new(pos.x, pos.y + self.config.node_height / 2.0)
    }

    fn top_center(&self, pos: Vec2) -> Vec2 {
        Vec2::new(pos.x, pos.y - self.config.node_height / 2.0)
    }

    /// Nodes in layout order: bands bottom-up, rows bottom-up, then by name.
    pub fn nodes(&self) -> Vec<RenderNode> {
        let size = Vec2::new(self.config.node_width, self.config.node_height);
        let mut nodes = Vec::with_capacity(self.graph.node_count());
        for layer in &self.layout.layers {
            for id in layer.rows.iter().flatten() {
                let (Some(node), Some(position)) = (self.graph.get(id), self.layout.position(id))
                else {
                    continue;
                };
                nodes.push(RenderNode {
                    id: node.id.clone(),
                    label: node.id.clone(),
                    group: node.group.clone(),
                    color: self.color_for(&node.group),
                    position,
                    size,
                    dependencies: node.dependency_ids().map(str::to_string).collect(),
                });
            }
        }
        nodes
    }

    /// Edges whose two endpoints both have a position. Anything else is a
    /// dangling reference and is left out.
    pub fn edges(&self, cycles: &[Vec<String>]) -> Vec<RenderEdge> {
        let on_cycle = cycle_edges(self.graph, cycles);
        let mut edges = Vec::new();
        for edge in self.graph.edges() {
            let (Some(from), Some(to)) = (
                self.layout.position(&edge.source),
                self.layout.position(&edge.target),
            ) else {
                tracing::debug!(
                    "Skipping edge {:?} -> {:?}: endpoint has no position",
                    edge.source,
                    edge.target
                );
                continue;
            };
            let origin = self.graph[edge.target.as_str()]
                .dependencies
                .iter()
                .find(|dep| dep.id == edge.source)
                .map_or(DependencyOrigin::Explicit, |dep| dep.origin);
            let in_cycle = on_cycle.contains(&(edge.source.clone(), edge.target.clone()));
            edges.push(RenderEdge {
                from: self.bottom_center(from),
                to: self.top_center(to),
                origin,
                in_cycle,
                style: get_edge_style(origin, in_cycle),
                source: edge.source,
                target: edge.target,
            });
        }
        edges
    }

    pub fn layers(&self) -> Vec<RenderLayer> {
        let half_width = self.config.node_width / 2.0;
        let label_lift = self.config.node_height / 2.0;
        self.layout
            .layers
            .iter()
            .filter_map(|layer| {
                let label = self.layout.label(layer.key)?;
                let min_x = layer
                    .rows
                    .iter()
                    .flatten()
                    .filter_map(|id| self.layout.position(id))
                    .map(|pos| pos.x)
                    .fold(f32::INFINITY, f32::min);
                let display_name = match layer.key {
                    LayerKey::Ungrouped => UNGROUPED_LABEL.to_string(),
                    LayerKey::Ranked(_) => self
                        .catalog
                        .find(&layer.group)
                        .map_or_else(|| layer.group.clone(), |g| g.label().to_string()),
                };
                let separator_y = label.y - label_lift;
                Some(RenderLayer {
                    key: layer.key,
                    group: layer.group.clone(),
                    display_name,
                    color: self.color_for(&layer.group),
                    label_anchor: Vec2::new(label.x, label.y),
                    separator_from: Vec2::new(min_x - half_width, separator_y),
                    separator_to: Vec2::new(label.x + half_width, separator_y),
                })
            })
            .collect()
    }

    pub fn view(&self) -> ComponentsGraphView {
        let cycles = find_cycles(self.graph);
        ComponentsGraphView {
            nodes: self.nodes(),
            edges: self.edges(&cycles),
            layers: self.layers(),
            cycles,
        }
    }
}

/// Detail-panel data for the rule named `id`. Has no effect on layout.
pub fn select(rules: &[Rule], graph: &RuleGraph, id: &str) -> Option<RuleDetails> {
    let rule = rules.iter().find(|rule| rule.target == id)?;
    Some(RuleDetails {
        target: rule.target.clone(),
        expression: rule.expression.clone(),
        depends_on: rule.depends_on.clone(),
        group: rule.metadata.group.clone(),
        effective_from: rule.metadata.effective_from,
        effective_to: rule.metadata.effective_to,
        used_by: graph.dependents_of(id),
    })
}
