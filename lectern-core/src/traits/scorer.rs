//! Confidence scoring trait.

use async_trait::async_trait;

use crate::{ConfidenceScore, Result};

/// Rates how answerable a query is expected to be.
///
/// The router only consumes the resulting score and level; how a scorer
/// arrives at them is up to the implementation.
#[async_trait]
pub trait ConfidenceScorer: Send + Sync + std::fmt::Debug {
    /// Score `query`, optionally considering earlier turns of the same thread.
    async fn score(&self, query: &str, history: &[String]) -> Result<ConfidenceScore>;
}
