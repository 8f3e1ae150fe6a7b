//! Confidence scoring and adaptive routing.

pub mod confidence;
pub mod router;

pub use confidence::HeuristicConfidenceScorer;
pub use router::{AdaptiveRouter, RouterMetrics, normalize_cache_key};
