//! # Lectern Core
//!
//! Core traits, types and shared machinery for the Lectern hybrid retrieval
//! and answer-grounding engine.
//!
//! This crate provides:
//!
//! - **Data structures**: `Material`, `RetrievalResult`, routing decisions,
//!   grounding results and document hierarchies
//! - **Core traits**: `Retriever`, `Embedder`, `VectorStore`,
//!   `CompletionModel`, `ConfidenceScorer`, `RouteCache`
//! - **Caching**: an in-memory route cache with per-entry TTL and LRU eviction
//! - **Configuration**: serializable, validated configuration loaded from TOML
//! - **Utilities**: tokenization, cosine and Jaccard similarity
//!
//! ## Quick Start
//!
//! ```rust
//! use lectern_core::prelude::*;
//! use lectern_core::utils::cosine_similarity;
//!
//! let config = LecternConfig::default();
//! assert!(config.validate().is_ok());
//!
//! let sim = cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]).unwrap();
//! assert!((sim - 1.0).abs() < 1e-6);
//! ```

#![deny(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod prelude;

pub mod cache;
pub mod config;
pub mod error;
pub mod traits;
pub mod types;
pub mod utils;

pub use error::{LecternError, Result};
pub use types::{
    ClaimSeverity, ConfidenceFactor, ConfidenceLevel, ConfidenceScore, DocumentHierarchy,
    DocumentHierarchyBuilder, GroundingLevel, GroundingRequest, GroundingResult, HierarchyNode,
    Material, MaterialType, RankSource, RankedResult, RetrievalResult, RouteOutcome,
    RoutingAction, RoutingDecision, SupportedClaim, UnsupportedClaim,
};

pub use traits::*;

/// Version information for the Lectern core library.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Name of the Lectern core library.
pub const NAME: &str = env!("CARGO_PKG_NAME");
