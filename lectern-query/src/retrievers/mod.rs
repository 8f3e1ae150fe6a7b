//! Retrievers for course materials.
//!
//! - [`Bm25Retriever`]: lexical ranking over corpus statistics
//! - [`DenseRetriever`]: embedding similarity via an injected vector store
//! - [`HybridRetriever`]: concurrent lexical + dense retrieval fused with RRF

pub mod bm25;
pub mod dense;
pub mod hybrid;

pub use bm25::{Bm25Retriever, CorpusStats, DocumentStats};
pub use dense::{DEFAULT_EMBED_TIMEOUT, DenseRetriever};
pub use hybrid::{DEFAULT_HEADROOM, HybridRetriever};
