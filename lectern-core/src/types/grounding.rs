//! Grounding verification inputs and results.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use strum::{Display, EnumString};

use super::Material;

/// How well an answer is supported by its sources.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum GroundingLevel {
    /// Score of at least 0.8.
    WellGrounded,
    /// Score of at least 0.5.
    PartiallyGrounded,
    /// Anything lower.
    PoorlyGrounded,
}

impl GroundingLevel {
    /// Map a `0.0..=1.0` score to a level.
    pub fn from_score(score: f32) -> Self {
        if score >= 0.8 {
            Self::WellGrounded
        } else if score >= 0.5 {
            Self::PartiallyGrounded
        } else {
            Self::PoorlyGrounded
        }
    }
}

/// Severity the judge assigned to an unsupported claim.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ClaimSeverity {
    /// Minor embellishment.
    Low,
    /// Unsupported but plausible.
    #[default]
    Medium,
    /// Likely wrong or misleading.
    High,
}

/// A claim the judge traced back to one or more materials.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupportedClaim {
    /// The claim text.
    pub claim: String,
    /// 1-based indices of supporting materials, as numbered in the prompt.
    #[serde(default)]
    pub supporting_materials: Vec<usize>,
    /// Judge confidence in `0.0..=1.0`.
    #[serde(default)]
    pub confidence: f32,
}

/// A claim the judge could not trace to the materials.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnsupportedClaim {
    /// The claim text.
    pub claim: String,
    /// Why the claim is unsupported.
    #[serde(default)]
    pub reason: String,
    /// How serious the gap is.
    #[serde(default)]
    pub severity: ClaimSeverity,
}

/// Input to a grounding check.
#[derive(Debug, Clone)]
pub struct GroundingRequest {
    /// The generated answer to check.
    pub answer: String,
    /// Materials the answer is supposed to be based on.
    pub materials: Vec<Arc<Material>>,
    /// Optional original question, for context.
    pub question: Option<String>,
    /// Override of the configured grounded threshold.
    pub threshold: Option<f32>,
}

impl GroundingRequest {
    /// Create a request with no question or threshold override.
    pub fn new(answer: impl Into<String>, materials: Vec<Arc<Material>>) -> Self {
        Self {
            answer: answer.into(),
            materials,
            question: None,
            threshold: None,
        }
    }

    /// Set the original question.
    #[must_use]
    pub fn with_question(mut self, question: impl Into<String>) -> Self {
        self.question = Some(question.into());
        self
    }

    /// Override the grounded threshold.
    #[must_use]
    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.threshold = Some(threshold);
        self
    }
}

/// Result of a grounding check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroundingResult {
    /// Supported fraction of claims, `0.0..=1.0`.
    pub score: f32,
    /// Whether the answer passes the grounding policy.
    pub is_grounded: bool,
    /// Level derived from `score`.
    pub level: GroundingLevel,
    /// Claims traced to materials.
    pub supported_claims: Vec<SupportedClaim>,
    /// Claims without support.
    pub unsupported_claims: Vec<UnsupportedClaim>,
    /// One-paragraph human readable summary.
    pub summary: String,
    /// When the check completed.
    pub checked_at: DateTime<Utc>,
}

impl GroundingResult {
    /// Total number of claims the judge identified.
    pub fn claim_count(&self) -> usize {
        self.supported_claims.len() + self.unsupported_claims.len()
    }
}
