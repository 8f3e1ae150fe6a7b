//! # Lectern
//!
//! Lectern retrieves course materials for student questions and checks that
//! generated answers are backed by them. Lexical and semantic retrieval are
//! fused, a confidence estimate decides how much retrieval effort a query
//! gets, and an LLM judge verifies answer grounding.
//!
//! ## Quick Start
//!
//! ```rust
//! use lectern::prelude::*;
//! use std::sync::Arc;
//!
//! # #[tokio::main]
//! # async fn main() -> lectern::core::Result<()> {
//! let materials = vec![
//!     Arc::new(Material::new("m1", "cs101", "Recursion", "A function calling itself")),
//!     Arc::new(Material::new("m2", "cs101", "Queues", "First in, first out")),
//!     Arc::new(Material::new("m3", "cs101", "Stacks", "Last in, first out")),
//! ];
//!
//! let dense = DenseRetriever::new(
//!     materials,
//!     Arc::new(HashingEmbedder::default()),
//!     Arc::new(InMemoryVectorStore::new()),
//! );
//! let results = dense.retrieve("function calling itself", 1).await?;
//! assert_eq!(results[0].id(), "m1");
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - **lectern-core**: data model, errors, traits, route cache, configuration
//! - **lectern-query**: retrievers, fusion, MMR, router, traversal, grounding
//! - **lectern-integrations**: in-memory vector store, hashing embedder, siumai judge

#![deny(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

// Re-export all public APIs from sub-crates
pub use lectern_core as core;
pub use lectern_integrations as integrations;
pub use lectern_query as query;

/// Prelude module for convenient imports.
///
/// This module re-exports the most commonly used types and traits
/// from all Lectern crates.
pub mod prelude {
    pub use lectern_query::prelude::*;

    pub use lectern_integrations::{HashingEmbedder, InMemoryVectorStore};
    #[cfg(feature = "siumai")]
    pub use lectern_integrations::{JudgeClientConfig, SiumaiCompletionModel};
}

/// Version information for the Lectern framework.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
