//! Retrieval traits.
//!
//! Lexical, dense and hybrid retrievers all expose the same capability:
//! given query text and a limit, return materials ordered by relevance.
//! Composite retrievers take other retrievers as `Arc<dyn Retriever>`.

use async_trait::async_trait;

use crate::{Result, RetrievalResult};

/// Finds relevant materials for a query.
///
/// # Examples
///
/// ```rust,no_run
/// use lectern_core::traits::Retriever;
/// use lectern_core::{RetrievalResult, Result};
/// use async_trait::async_trait;
///
/// #[derive(Debug)]
/// struct EmptyRetriever;
///
/// #[async_trait]
/// impl Retriever for EmptyRetriever {
///     async fn retrieve(&self, _query: &str, _limit: usize) -> Result<Vec<RetrievalResult>> {
///         Ok(vec![])
///     }
/// }
/// ```
#[async_trait]
pub trait Retriever: Send + Sync + std::fmt::Debug {
    /// Retrieve at most `limit` results for `query`, highest score first.
    ///
    /// Results never contain the same material twice.
    ///
    /// # Errors
    ///
    /// Returns an error if an injected dependency (embedding provider,
    /// vector store) fails. Such errors are reported as retryable.
    async fn retrieve(&self, query: &str, limit: usize) -> Result<Vec<RetrievalResult>>;

    /// Get a human-readable name for this retriever.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

/// Optional second-stage ranking applied after fusion.
#[async_trait]
pub trait Reranker: Send + Sync + std::fmt::Debug {
    /// Reorder (and optionally rescore) fused results.
    async fn rerank(&self, query: &str, results: Vec<RetrievalResult>)
    -> Result<Vec<RetrievalResult>>;

    /// Get a human-readable name for this reranker.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}
