use crate::error::ConfigError;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Geometry of the pyramid layout.
///
/// Every field has a default, so a partial JSON document only overrides the
/// values it names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    pub node_width: f32,
    pub node_height: f32,
    /// Space between neighbouring boxes in one row.
    pub horizontal_gap: f32,
    /// Distance between row centers inside one layer.
    pub row_gap: f32,
    /// Extra distance between the last row of a layer and the next layer.
    pub layer_gap: f32,
    pub max_nodes_per_row: usize,
    /// Horizontal center every row is centered on.
    pub center_x: f32,
    /// Y of the lowest row of the lowest layer.
    pub base_y: f32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            node_width: Self::DEFAULT_NODE_WIDTH,
            node_height: Self::DEFAULT_NODE_HEIGHT,
            horizontal_gap: Self::DEFAULT_HORIZONTAL_GAP,
            row_gap: Self::DEFAULT_ROW_GAP,
            layer_gap: Self::DEFAULT_LAYER_GAP,
            max_nodes_per_row: Self::DEFAULT_MAX_NODES_PER_ROW,
            center_x: Self::DEFAULT_CENTER_X,
            base_y: Self::DEFAULT_BASE_Y,
        }
    }
}

impl LayoutConfig {
    pub const DEFAULT_NODE_WIDTH: f32 = 140.0;
    pub const DEFAULT_NODE_HEIGHT: f32 = 50.0;
    pub const DEFAULT_HORIZONTAL_GAP: f32 = 20.0;
    pub const DEFAULT_ROW_GAP: f32 = 70.0;
    pub const DEFAULT_LAYER_GAP: f32 = 80.0;
    pub const DEFAULT_MAX_NODES_PER_ROW: usize = 4;
    pub const DEFAULT_CENTER_X: f32 = 600.0;
    pub const DEFAULT_BASE_Y: f32 = 900.0;

    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(raw).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read layout config {}", path.display()))?;
        let config = Self::from_json_str(&content)
            .with_context(|| format!("Failed to load layout config {}", path.display()))?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("node_width", self.node_width),
            ("node_height", self.node_height),
        ] {
            if !(value > 0.0) {
                return Err(ConfigError::NonPositive { field, value });
            }
        }
        for (field, value) in [
            ("horizontal_gap", self.horizontal_gap),
            ("row_gap", self.row_gap),
            ("layer_gap", self.layer_gap),
        ] {
            if !(value >= 0.0) {
                return Err(ConfigError::Negative { field, value });
            }
        }
        if self.max_nodes_per_row == 0 {
            return Err(ConfigError::EmptyRow);
        }
        Ok(())
    }

    /// Horizontal distance between the centers of two neighbouring boxes.
    pub fn column_pitch(&self) -> f32 {
        self.node_width + self.horizontal_gap
    }

    /// Row capacity clamped so that layout stays total on bad input.
    pub fn row_capacity(&self) -> usize {
        self.max_nodes_per_row.max(1)
    }
}
