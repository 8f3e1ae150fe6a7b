//! Prelude module for convenient imports.
//!
//! # Examples
//!
//! ```rust
//! use lectern_core::prelude::*;
//!
//! let material = Material::new("m1", "cs101", "Recursion", "A function calling itself.")
//!     .with_type(MaterialType::Lecture);
//! assert_eq!(material.material_type, MaterialType::Lecture);
//! ```

// Error types
pub use crate::error::{LecternError, Result};

// Data types
pub use crate::types::{
    ClaimSeverity, ConfidenceFactor, ConfidenceLevel, ConfidenceScore, DocumentHierarchy,
    DocumentHierarchyBuilder, GroundingLevel, GroundingRequest, GroundingResult, HierarchyNode,
    Material, MaterialType, RankSource, RankedResult, RetrievalResult, RouteOutcome,
    RoutingAction, RoutingDecision, SupportedClaim, UnsupportedClaim,
};

// Core traits
pub use crate::traits::{
    CacheStats, CompletionModel, CompletionRequest, CompletionResponse, ConfidenceScorer,
    Embedder, Reranker, Retriever, RouteCache, VectorStore,
};

// Configuration
pub use crate::config::{
    Bm25Params, CacheTtlConfig, ConfidenceThresholds, LecternConfig, RetrievalConfig,
    RouterConfig, TraversalConfig, TraversalStrategy, VerifierConfig,
};

// Cache
pub use crate::cache::MemoryRouteCache;
