//! Retrieval, routing and grounding for the Lectern engine.
//!
//! This crate turns the traits of `lectern-core` into a working retrieval
//! stack over course materials. It includes:
//!
//! - **Retrievers**: BM25 keyword search, embedding search and their hybrid
//! - **Fusion**: weighted Reciprocal Rank Fusion of ranked lists
//! - **Postprocessing**: Maximal Marginal Relevance diversification
//! - **Routing**: heuristic query confidence and an adaptive router with
//!   confidence-tiered caching
//! - **Hierarchy traversal**: BFS, DFS and adaptive walks over topic trees
//! - **Grounding**: LLM-judged verification of generated answers
//! - **Pipeline**: all of the above wired together
//!
//! # Quick Start
//!
//! ```rust
//! use lectern_query::prelude::*;
//! use std::sync::Arc;
//!
//! # #[tokio::main]
//! # async fn main() -> lectern_core::Result<()> {
//! let materials = vec![
//!     Arc::new(Material::new("m1", "cs101", "Recursion", "A function that calls itself")),
//!     Arc::new(Material::new("m2", "cs101", "Loops", "Iterate with for and while")),
//!     Arc::new(Material::new("m3", "cs101", "Sorting", "Merge sort splits and merges")),
//! ];
//! let bm25 = Bm25Retriever::new(materials, Bm25Params::default())?;
//!
//! let results = bm25.retrieve("recursion", 5).await?;
//! assert_eq!(results[0].id(), "m1");
//! # Ok(())
//! # }
//! ```
//!
//! # Architecture
//!
//! ```text
//! Query → ConfidenceScorer → AdaptiveRouter ─→ RouteCache
//!   ↓
//! HybridRetriever (BM25 ∥ Dense → RRF) → course filter → MMR
//!   ↓                                         ↓
//! HierarchyTraverser (aggressive routes)   GroundingVerifier → CompletionModel
//! ```

#![deny(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod fusion;
pub mod grounding;
pub mod hierarchical;
pub mod pipeline;
pub mod postprocessor;
pub mod retrievers;
pub mod routing;

/// Re-export commonly used types and traits.
pub mod prelude {
    pub use crate::fusion::{DEFAULT_RRF_K, ReciprocalRankFusion};
    pub use crate::grounding::{FALLBACK_SCORE, GroundingVerifier, JudgeResponseParser};
    pub use crate::hierarchical::{
        HierarchyTraverser, TraversalMetrics, TraversalResult, TraversedNode,
    };
    pub use crate::pipeline::{
        AdaptivePipeline, AdaptivePipelineBuilder, HierarchySearch, PipelineResponse,
    };
    pub use crate::postprocessor::{DEFAULT_MMR_LAMBDA, MmrDiversifier};
    pub use crate::retrievers::{Bm25Retriever, DenseRetriever, HybridRetriever};
    pub use crate::routing::{
        AdaptiveRouter, HeuristicConfidenceScorer, RouterMetrics, normalize_cache_key,
    };

    // Re-export core types
    pub use lectern_core::prelude::*;
}

/// Version information for the Lectern query library.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
