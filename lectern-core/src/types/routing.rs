//! Confidence scores and routing decisions.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Categorical confidence tier derived from a numeric score.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ConfidenceLevel {
    /// The query is expected to be answerable with standard effort.
    High,
    /// Some uncertainty.
    Medium,
    /// Likely hard to answer from the corpus.
    Low,
}

/// One heuristic contribution to a confidence score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceFactor {
    /// Short machine readable name, e.g. `course_vocabulary`.
    pub name: String,
    /// Signed contribution in score points.
    pub delta: f32,
}

/// Expected answerability of a query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceScore {
    /// Score in `0.0..=100.0`.
    pub score: f32,
    /// Tier derived from the configured thresholds.
    pub level: ConfidenceLevel,
    /// Contributions that produced the score, for diagnostics.
    #[serde(default)]
    pub factors: Vec<ConfidenceFactor>,
}

impl ConfidenceScore {
    /// Create a score without factor details.
    pub fn new(score: f32, level: ConfidenceLevel) -> Self {
        Self {
            score,
            level,
            factors: Vec::new(),
        }
    }
}

/// The single terminal action the router picks for a query.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RoutingAction {
    /// Serve a previously cached result.
    UseCache,
    /// Normal retrieval.
    RetrieveStandard,
    /// Retrieval with a wider candidate pool.
    RetrieveExpanded,
    /// Widest candidate pool plus hierarchy traversal.
    RetrieveAggressive,
}

impl RoutingAction {
    /// All actions, in escalating order of effort.
    pub const ALL: [Self; 4] = [
        Self::UseCache,
        Self::RetrieveStandard,
        Self::RetrieveExpanded,
        Self::RetrieveAggressive,
    ];

    /// Whether the action requires running retrieval.
    pub fn should_retrieve(self) -> bool {
        !matches!(self, Self::UseCache)
    }

    /// Whether the action widens the candidate pool.
    pub fn expands(self) -> bool {
        matches!(self, Self::RetrieveExpanded | Self::RetrieveAggressive)
    }

    /// Whether the action is the aggressive tier.
    pub fn is_aggressive(self) -> bool {
        matches!(self, Self::RetrieveAggressive)
    }
}

/// Outcome of routing one query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutingDecision {
    /// The chosen action.
    pub action: RoutingAction,
    /// Whether retrieval must run.
    pub should_retrieve: bool,
    /// Whether the candidate pool is widened.
    pub expand: bool,
    /// Whether aggressive retrieval is used.
    pub aggressive: bool,
    /// Human readable explanation.
    pub reasoning: String,
    /// Cache key, present whenever the query scored high confidence.
    pub cache_key: Option<String>,
    /// The confidence the decision was based on.
    pub confidence: ConfidenceScore,
}

impl RoutingDecision {
    /// Build a decision whose flags are derived from `action`.
    pub fn new(
        action: RoutingAction,
        reasoning: impl Into<String>,
        cache_key: Option<String>,
        confidence: ConfidenceScore,
    ) -> Self {
        Self {
            action,
            should_retrieve: action.should_retrieve(),
            expand: action.expands(),
            aggressive: action.is_aggressive(),
            reasoning: reasoning.into(),
            cache_key,
            confidence,
        }
    }
}

/// A routing decision plus the cached value when the action is `UseCache`.
#[derive(Debug, Clone)]
pub struct RouteOutcome<V> {
    /// The decision.
    pub decision: RoutingDecision,
    /// Cached value, only set for cache hits.
    pub cached: Option<V>,
}
