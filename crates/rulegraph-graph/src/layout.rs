//! Layered "pyramid" layout.
//!
//! Every group becomes a horizontal band. Bands are stacked bottom-up in rank
//! order (rank 1 lowest on screen, i.e. largest y), nodes inside a band are
//! sorted by name and wrapped into centered rows. Rules whose group is not in
//! the ranking share one extra band above the highest ranked one.

use crate::graph::Node;
use crate::ranking::GroupRanking;
use rulegraph_core::{LayoutConfig, UNGROUPED};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Identifies a band. Ranked bands order before the ungrouped one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum LayerKey {
    Ranked(u32),
    Ungrouped,
}

/// A band as placed: its rows of node ids and vertical offset above the base.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerPlacement {
    pub key: LayerKey,
    /// Normalized group name, or `"ungrouped"` for the catch-all band.
    pub group: String,
    /// Rows top-down, each sorted by id and at most `max_nodes_per_row` long.
    pub rows: Vec<Vec<String>>,
    /// Distance from `base_y` up to the band's lowest row.
    pub offset: f32,
}

impl LayerPlacement {
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn node_count(&self) -> usize {
        self.rows.iter().map(Vec::len).sum()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.rows.iter().flatten().any(|member| member == id)
    }
}

/// Anchor for a band's caption and dashed separator.
///
/// `y` is the smallest node y of the band (its topmost row), `x` the largest
/// node x (right end of the separator).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LayerLabel {
    pub key: LayerKey,
    pub x: f32,
    pub y: f32,
}

/// Output of the layout: node centers plus band geometry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PyramidLayout {
    pub positions: BTreeMap<String, Vec2>,
    /// Bands in stacking order, bottom first.
    pub layers: Vec<LayerPlacement>,
    pub labels: Vec<LayerLabel>,
}

impl PyramidLayout {
    pub fn position(&self, id: &str) -> Option<Vec2> {
        self.positions.get(id).copied()
    }

    pub fn layer_of(&self, id: &str) -> Option<&LayerPlacement> {
        self.layers.iter().find(|layer| layer.contains(id))
    }

    pub fn label(&self, key: LayerKey) -> Option<&LayerLabel> {
        self.labels.iter().find(|label| label.key == key)
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

pub trait Layouter {
    fn execute(&self, nodes: &[Node], ranking: &GroupRanking) -> PyramidLayout;
}

#[derive(Debug, Clone, Default)]
pub struct PyramidLayouter {
    pub config: LayoutConfig,
}

impl PyramidLayouter {
    pub fn new(config: LayoutConfig) -> Self {
        Self { config }
    }

    /// Bucket node ids by band, each bucket sorted by id.
    fn partition<'a>(
        nodes: &'a [Node],
        ranking: &GroupRanking,
    ) -> BTreeMap<LayerKey, Vec<&'a str>> {
        let mut buckets: BTreeMap<LayerKey, Vec<&str>> = BTreeMap::new();
        for node in nodes {
            let key = ranking
                .ordinal(&node.group)
                .map_or(LayerKey::Ungrouped, LayerKey::Ranked);
            buckets.entry(key).or_default().push(node.id.as_str());
        }
        for members in buckets.values_mut() {
            members.sort();
        }
        buckets
    }

    fn wrap_rows(&self, members: &[&str]) -> Vec<Vec<String>> {
        members
            .chunks(self.config.row_capacity())
            .map(|row| row.iter().map(|id| id.to_string()).collect())
            .collect()
    }

    /// Vertical space a band claims before the next band starts.
    fn layer_extent(&self, row_count: usize) -> f32 {
        row_count as f32 * self.config.row_gap + self.config.layer_gap
    }

    /// X of the `index`-th box center in a row of `count` boxes.
    fn column_x(&self, index: usize, count: usize) -> f32 {
        let pitch = self.config.column_pitch();
        let total_width = count as f32 * pitch - self.config.horizontal_gap;
        self.config.center_x - total_width / 2.0
            + index as f32 * pitch
            + self.config.node_width / 2.0
    }

    /// Y of row `row` in a band; row 0 sits on the band base and later rows
    /// stack above it.
    fn row_y(&self, offset: f32, row: usize) -> f32 {
        self.config.base_y - offset - row as f32 * self.config.row_gap
    }

    fn place_layer(
        &self,
        layer: &LayerPlacement,
        positions: &mut BTreeMap<String, Vec2>,
    ) -> Option<LayerLabel> {
        let mut anchor: Option<Vec2> = None;

        for (row_idx, row) in layer.rows.iter().enumerate() {
            let y = self.row_y(layer.offset, row_idx);
            for (col_idx, id) in row.iter().enumerate() {
                let pos = Vec2::new(self.column_x(col_idx, row.len()), y);
                anchor = Some(match anchor {
                    None => pos,
                    Some(a) => Vec2::new(a.x.max(pos.x), a.y.min(pos.y)),
                });
                positions.insert(id.clone(), pos);
            }
        }

        anchor.map(|a| LayerLabel {
            key: layer.key,
            x: a.x,
            y: a.y,
        })
    }
}

impl Layouter for PyramidLayouter {
    fn execute(&self, nodes: &[Node], ranking: &GroupRanking) -> PyramidLayout {
        let mut layout = PyramidLayout::default();
        if nodes.is_empty() {
            return layout;
        }

        let buckets = Self::partition(nodes, ranking);
        let mut offset = 0.0;

        // BTreeMap order is ascending rank with the ungrouped band last, and
        // only non-empty buckets exist, so empty groups take no space.
        for (key, members) in buckets {
            let group = match key {
                LayerKey::Ranked(ordinal) => ranking.group_at(ordinal).unwrap_or(UNGROUPED),
                LayerKey::Ungrouped => UNGROUPED,
            };
            let placement = LayerPlacement {
                key,
                group: group.to_string(),
                rows: self.wrap_rows(&members),
                offset,
            };
            offset += self.layer_extent(placement.row_count());

            if let Some(label) = self.place_layer(&placement, &mut layout.positions) {
                layout.labels.push(label);
            }
            layout.layers.push(placement);
        }

        tracing::debug!(
            "Pyramid layout placed {} nodes in {} layers",
            layout.positions.len(),
            layout.layers.len()
        );
        layout
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rulegraph_core::Group;

    fn node(id: &str, group: &str) -> Node {
        Node {
            id: id.to_string(),
            group: group.to_string(),
            dependencies: Vec::new(),
        }
    }

    fn ranking(groups: &[(&str, i64)]) -> GroupRanking {
        let groups: Vec<Group> = groups
            .iter()
            .map(|(name, order)| Group::new(*name, *name, "", *order))
            .collect();
        GroupRanking::from_groups(&groups)
    }

    fn layouter() -> PyramidLayouter {
        PyramidLayouter::default()
    }

    #[test]
    fn test_empty_input_yields_empty_layout() {
        let layout = layouter().execute(&[], &ranking(&[("core", 1)]));
        assert!(layout.is_empty());
        assert!(layout.labels.is_empty());
        assert!(layout.layers.is_empty());
    }

    #[test]
    fn test_single_node_is_centered_on_base() {
        let config = LayoutConfig::default();
        let layout = layouter().execute(&[node("Base", "core")], &ranking(&[("core", 1)]));
        let pos = layout.position("Base").unwrap();
        assert_eq!(pos, Vec2::new(config.center_x, config.base_y));
    }

    #[test]
    fn test_row_is_centered() {
        let config = LayoutConfig::default();
        let nodes = vec![node("B", "core"), node("A", "core")];
        let layout = layouter().execute(&nodes, &ranking(&[("core", 1)]));
        let a = layout.position("A").unwrap();
        let b = layout.position("B").unwrap();
        // total width 300: boxes centered at center -80 and center +80
        assert_eq!(a.x, config.center_x - 80.0);
        assert_eq!(b.x, config.center_x + 80.0);
        assert_eq!(a.y, b.y);
    }

    #[test]
    fn test_row_wrapping_max_plus_one() {
        let nodes: Vec<Node> = ["N1", "N2", "N3", "N4", "N5"]
            .iter()
            .map(|id| node(id, "core"))
            .collect();
        let layout = layouter().execute(&nodes, &ranking(&[("core", 1)]));
        let layer = &layout.layers[0];
        assert_eq!(layer.row_count(), 2);
        assert_eq!(layer.rows[0], vec!["N1", "N2", "N3", "N4"]);
        assert_eq!(layer.rows[1], vec!["N5"]);

        let config = LayoutConfig::default();
        // The full row sits on the base; the remainder narrows above it.
        assert_eq!(layout.position("N1").unwrap().y, config.base_y);
        assert_eq!(layout.position("N4").unwrap().y, config.base_y);
        assert_eq!(layout.position("N5").unwrap().y, config.base_y - config.row_gap);
        assert_eq!(layout.position("N5").unwrap().x, config.center_x);
    }

    #[test]
    fn test_layers_stack_upwards_by_rank() {
        let config = LayoutConfig::default();
        let nodes = vec![node("Bonus", "bonus"), node("Base", "core")];
        let layout = layouter().execute(&nodes, &ranking(&[("bonus", 2), ("core", 1)]));
        let base = layout.position("Base").unwrap();
        let bonus = layout.position("Bonus").unwrap();
        assert_eq!(base.y, config.base_y);
        assert_eq!(bonus.y, config.base_y - config.row_gap - config.layer_gap);
        assert_eq!(layout.layers[0].key, LayerKey::Ranked(1));
        assert_eq!(layout.layers[1].key, LayerKey::Ranked(2));
        assert_eq!(layout.layers[1].group, "bonus");
    }

    #[test]
    fn test_layer_offset_accounts_for_row_count() {
        let config = LayoutConfig::default();
        let mut nodes: Vec<Node> = (0..9).map(|i| node(&format!("C{i}"), "core")).collect();
        nodes.push(node("Top", "bonus"));
        let layout = layouter().execute(&nodes, &ranking(&[("core", 1), ("bonus", 2)]));
        assert_eq!(layout.layers[0].row_count(), 3);
        let expected_offset = 3.0 * config.row_gap + config.layer_gap;
        assert_eq!(layout.layers[1].offset, expected_offset);
        assert_eq!(layout.position("Top").unwrap().y, config.base_y - expected_offset);
    }

    #[test]
    fn test_empty_group_takes_no_space() {
        let config = LayoutConfig::default();
        let nodes = vec![node("Base", "core"), node("Total", "total")];
        let layout = layouter().execute(
            &nodes,
            &ranking(&[("core", 1), ("bonus", 2), ("total", 3)]),
        );
        assert_eq!(layout.layers.len(), 2);
        assert_eq!(layout.labels.len(), 2);
        assert!(layout.label(LayerKey::Ranked(2)).is_none());
        assert_eq!(
            layout.position("Total").unwrap().y,
            config.base_y - config.row_gap - config.layer_gap
        );
    }

    #[test]
    fn test_unmatched_groups_go_above_all_ranked_layers() {
        let nodes = vec![
            node("Base", "core"),
            node("Misc", "misc"),
            node("Loose", UNGROUPED),
            node("Bonus", "bonus"),
        ];
        let layout = layouter().execute(&nodes, &ranking(&[("core", 1), ("bonus", 2)]));
        let top = layout.layers.last().unwrap();
        assert_eq!(top.key, LayerKey::Ungrouped);
        assert_eq!(top.group, UNGROUPED);
        assert_eq!(top.rows, vec![vec!["Loose".to_string(), "Misc".to_string()]]);

        let bonus_y = layout.position("Bonus").unwrap().y;
        assert!(layout.position("Misc").unwrap().y < bonus_y);
    }

    #[test]
    fn test_everything_ungrouped_without_catalog() {
        let config = LayoutConfig::default();
        let nodes = vec![node("A", "core"), node("B", "bonus")];
        let layout = layouter().execute(&nodes, &GroupRanking::default());
        assert_eq!(layout.layers.len(), 1);
        assert_eq!(layout.layers[0].key, LayerKey::Ungrouped);
        assert_eq!(layout.position("A").unwrap().y, config.base_y);
    }

    #[test]
    fn test_label_anchor_is_max_x_min_y() {
        let config = LayoutConfig::default();
        let nodes: Vec<Node> = ["A", "B", "C", "D", "E"]
            .iter()
            .map(|id| node(id, "core"))
            .collect();
        let layout = layouter().execute(&nodes, &ranking(&[("core", 1)]));
        let label = layout.label(LayerKey::Ranked(1)).unwrap();
        assert_eq!(label.y, config.base_y - config.row_gap);
        assert_eq!(label.y, layout.position("E").unwrap().y);
        assert_eq!(label.x, layout.position("D").unwrap().x);
    }

    #[test]
    fn test_names_sort_case_sensitively() {
        let nodes = vec![node("bonus", "core"), node("Zeta", "core"), node("Alpha", "core")];
        let layout = layouter().execute(&nodes, &ranking(&[("core", 1)]));
        assert_eq!(layout.layers[0].rows[0], vec!["Alpha", "Zeta", "bonus"]);
    }

    #[test]
    fn test_custom_config_geometry() {
        let config = LayoutConfig {
            node_width: 100.0,
            horizontal_gap: 10.0,
            max_nodes_per_row: 2,
            center_x: 0.0,
            base_y: 0.0,
            ..Default::default()
        };
        let nodes = vec![node("A", "core"), node("B", "core"), node("C", "core")];
        let layout = PyramidLayouter::new(config).execute(&nodes, &ranking(&[("core", 1)]));
        assert_eq!(layout.position("A").unwrap(), Vec2::new(-55.0, 0.0));
        assert_eq!(layout.position("B").unwrap(), Vec2::new(55.0, 0.0));
        assert_eq!(layout.position("C").unwrap(), Vec2::new(0.0, -70.0));
    }

    #[test]
    fn test_zero_row_capacity_is_clamped() {
        let config = LayoutConfig {
            max_nodes_per_row: 0,
            ..Default::default()
        };
        let nodes = vec![node("A", "core"), node("B", "core")];
        let layout = PyramidLayouter::new(config).execute(&nodes, &ranking(&[("core", 1)]));
        assert_eq!(layout.layers[0].row_count(), 2);
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        const GROUPS: [&str; 5] = ["core", "allowance", "bonus", "total", "misc"];

        fn catalog() -> GroupRanking {
            // "misc" is deliberately left out so it lands in the ungrouped band.
            ranking(&[("core", 1), ("allowance", 2), ("bonus", 3), ("total", 4)])
        }

        fn nodes_strategy() -> impl Strategy<Value = (Vec<Node>, Vec<Node>)> {
            prop::collection::btree_map("[A-Z][a-z]{1,6}[0-9]?", 0usize..GROUPS.len(), 0..40)
                .prop_map(|members| {
                    members
                        .into_iter()
                        .map(|(id, group)| node(&id, GROUPS[group]))
                        .collect::<Vec<_>>()
                })
                .prop_flat_map(|nodes| (Just(nodes.clone()), Just(nodes).prop_shuffle()))
        }

        proptest! {
            /// Input order never changes the result.
            #[test]
            fn prop_layout_is_deterministic((nodes, shuffled) in nodes_strategy()) {
                let ranking = catalog();
                let a = layouter().execute(&nodes, &ranking);
                let b = layouter().execute(&shuffled, &ranking);
                prop_assert_eq!(
                    serde_json::to_string(&a).unwrap(),
                    serde_json::to_string(&b).unwrap()
                );
            }

            /// Every node is placed exactly once and rows respect capacity.
            #[test]
            fn prop_every_node_placed_once((nodes, _) in nodes_strategy()) {
                let layout = layouter().execute(&nodes, &catalog());
                prop_assert_eq!(layout.positions.len(), nodes.len());
                let placed: usize = layout.layers.iter().map(LayerPlacement::node_count).sum();
                prop_assert_eq!(placed, nodes.len());
                for layer in &layout.layers {
                    for row in &layer.rows {
                        prop_assert!(!row.is_empty());
                        prop_assert!(row.len() <= LayoutConfig::DEFAULT_MAX_NODES_PER_ROW);
                    }
                }
            }

            /// A lower-ranked band sits strictly below every row of a higher one.
            #[test]
            fn prop_layers_do_not_interleave((nodes, _) in nodes_strategy()) {
                let layout = layouter().execute(&nodes, &catalog());
                for pair in layout.layers.windows(2) {
                    let lowest_of_upper = pair[1]
                        .rows
                        .iter()
                        .flatten()
                        .map(|id| layout.positions[id].y)
                        .fold(f32::MIN, f32::max);
                    for id in pair[0].rows.iter().flatten() {
                        prop_assert!(layout.positions[id].y > lowest_of_upper);
                    }
                }
            }

            /// Boxes in the same row never overlap.
            #[test]
            fn prop_rows_do_not_overlap((nodes, _) in nodes_strategy()) {
                let config = LayoutConfig::default();
                let layout = layouter().execute(&nodes, &catalog());
                for layer in &layout.layers {
                    for row in &layer.rows {
                        for pair in row.windows(2) {
                            let left = layout.positions[&pair[0]].x;
                            let right = layout.positions[&pair[1]].x;
                            prop_assert!(right - left >= config.node_width);
                        }
                    }
                }
            }
        }
    }
}
