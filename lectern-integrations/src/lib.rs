//! Backend integrations for Lectern.
//!
//! This crate provides concrete implementations of the `lectern-core`
//! storage, embedding and completion traits:
//!
//! - [`InMemoryVectorStore`]: exhaustive cosine search over an async-locked map
//! - [`HashingEmbedder`]: deterministic feature-hashing embeddings, no model needed
//! - [`llm::SiumaiCompletionModel`]: grounding judge over any siumai provider
//!   (feature `siumai`, enabled by default)

#![deny(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod embedders;
#[cfg(feature = "siumai")]
pub mod llm;
pub mod vector_stores;

// Re-export commonly used types
pub use embedders::HashingEmbedder;
#[cfg(feature = "siumai")]
pub use llm::{JudgeClientConfig, JudgeProvider, SiumaiCompletionModel};
pub use vector_stores::InMemoryVectorStore;
