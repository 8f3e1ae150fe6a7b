//! Configuration for hierarchy traversal.

use serde::{Deserialize, Serialize};

use crate::{LecternError, Result};

/// Order in which a document hierarchy is explored.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TraversalStrategy {
    /// Level-order exploration.
    BreadthFirst,
    /// Pre-order exploration.
    DepthFirst,
    /// Breadth-first, diving depth-first into strongly matching subtrees.
    #[default]
    Adaptive,
}

/// Hierarchy traversal configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TraversalConfig {
    /// Exploration order.
    pub strategy: TraversalStrategy,

    /// Nodes below this similarity are recorded but not selected or expanded.
    pub min_similarity: f32,

    /// Deepest level whose children may be explored. `None` is unbounded.
    pub max_depth: Option<usize>,

    /// Maximum number of nodes returned.
    pub max_nodes: usize,

    /// Similarity above which the adaptive strategy dives depth-first.
    pub adaptive_switch_threshold: f32,
}

impl Default for TraversalConfig {
    fn default() -> Self {
        Self {
            strategy: TraversalStrategy::default(),
            min_similarity: 0.5,
            max_depth: None,
            max_nodes: 10,
            adaptive_switch_threshold: 0.8,
        }
    }
}

impl TraversalConfig {
    /// Set the strategy.
    #[must_use]
    pub fn with_strategy(mut self, strategy: TraversalStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Set the minimum similarity.
    #[must_use]
    pub fn with_min_similarity(mut self, min_similarity: f32) -> Self {
        self.min_similarity = min_similarity;
        self
    }

    /// Set the maximum depth.
    #[must_use]
    pub fn with_max_depth(mut self, max_depth: Option<usize>) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Set the maximum number of returned nodes.
    #[must_use]
    pub fn with_max_nodes(mut self, max_nodes: usize) -> Self {
        self.max_nodes = max_nodes;
        self
    }

    /// Validate the configuration.
    ///
    /// `min_similarity` may exceed 1.0, which simply selects nothing.
    pub fn validate(&self) -> Result<()> {
        if self.max_nodes == 0 {
            return Err(LecternError::configuration("max_nodes must be at least 1"));
        }
        if !self.min_similarity.is_finite() {
            return Err(LecternError::configuration(
                "min_similarity must be a finite number",
            ));
        }
        if !(-1.0..=1.0).contains(&self.adaptive_switch_threshold) {
            return Err(LecternError::configuration(format!(
                "adaptive_switch_threshold must be between -1.0 and 1.0, got {}",
                self.adaptive_switch_threshold
            )));
        }
        Ok(())
    }
}
