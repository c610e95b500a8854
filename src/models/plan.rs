use serde::{Deserialize, Serialize};

use super::Metric;

/// Which way a metric has to move to re-enter its band
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Increase,
    Decrease,
}

/// Planned correction for one failing metric
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EditPlan {
    pub metric: Metric,
    pub direction: Direction,
    /// Number of sentences (structural) or words (lexical) to edit, always >= 1
    pub edit_count: u32,
    /// Set when counts were unusable and the default edit count was used
    pub degraded: bool,
}
