pub mod cycles;
pub mod extractor;
pub mod graph;
pub mod layout;
pub mod ranking;
pub mod render;
pub mod style;

pub use cycles::{cycle_edges, find_cycles};
pub use extractor::{candidate_tokens, extract_references, strip_quoted_literals};
pub use graph::{Dependency, DependencyOrigin, GraphEdge, Node, RuleGraph, build_nodes};
pub use layout::{
    LayerKey, LayerLabel, LayerPlacement, Layouter, PyramidLayout, PyramidLayouter, Vec2,
};
pub use ranking::GroupRanking;
pub use render::{
    ComponentsGraphView, RenderAdapter, RenderEdge, RenderLayer, RenderNode, RuleDetails, select,
};
pub use style::{Color, EdgeStyle, get_edge_style, group_color};

use rulegraph_core::{GroupCatalog, LayoutConfig, Rule};

/// Rules + catalog in, drawable view out. Pure and deterministic.
pub fn components_graph(
    rules: &[Rule],
    catalog: &GroupCatalog,
    config: &LayoutConfig,
) -> ComponentsGraphView {
    let graph = RuleGraph::from_rules(rules);
    let ranking = GroupRanking::from_groups(&catalog.groups);
    let layout = PyramidLayouter::new(config.clone()).execute(graph.nodes(), &ranking);
    RenderAdapter::new(&graph, &layout, catalog, config).view()
}
