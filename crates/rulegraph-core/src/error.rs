use thiserror::Error;

/// Rejected layout configuration values.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("{field} must be positive, got {value}")]
    NonPositive { field: &'static str, value: f32 },
    #[error("{field} must not be negative, got {value}")]
    Negative { field: &'static str, value: f32 },
    #[error("max_nodes_per_row must be at least 1")]
    EmptyRow,
    #[error("Invalid layout config: {0}")]
    Parse(String),
}

/// Why a supplied group catalog could not be used as-is.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CatalogError {
    #[error("group catalog is unavailable: {0}")]
    Unavailable(String),
    #[error("group catalog contains no usable groups")]
    Empty,
}
