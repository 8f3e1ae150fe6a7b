//! Hybrid retriever fusing a lexical and a dense retriever with RRF.

use async_trait::async_trait;
use lectern_core::{
    RankSource, Result, RetrievalResult,
    config::RetrievalConfig,
    traits::{Reranker, Retriever},
};
use std::sync::Arc;
use tracing::{debug, info, instrument};

use crate::fusion::ReciprocalRankFusion;

/// Default over-fetch factor applied to each sub-retriever.
pub const DEFAULT_HEADROOM: usize = 2;

/// Runs a lexical and a dense retriever concurrently and fuses their ranks.
///
/// # Examples
///
/// ```rust,no_run
/// use lectern_query::retrievers::{Bm25Retriever, DenseRetriever, HybridRetriever};
/// use std::sync::Arc;
///
/// # fn example(bm25: Bm25Retriever, dense: DenseRetriever) {
/// let hybrid = HybridRetriever::new(Arc::new(bm25), Arc::new(dense));
/// # }
/// ```
#[derive(Debug)]
pub struct HybridRetriever {
    lexical: Arc<dyn Retriever>,
    dense: Arc<dyn Retriever>,
    fusion: ReciprocalRankFusion,
    headroom: usize,
    reranker: Option<Arc<dyn Reranker>>,
}

impl HybridRetriever {
    /// Combine `lexical` and `dense` with default fusion settings.
    pub fn new(lexical: Arc<dyn Retriever>, dense: Arc<dyn Retriever>) -> Self {
        Self {
            lexical,
            dense,
            fusion: ReciprocalRankFusion::default(),
            headroom: DEFAULT_HEADROOM,
            reranker: None,
        }
    }

    /// Combine `lexical` and `dense` using fusion settings from `config`.
    pub fn from_config(
        lexical: Arc<dyn Retriever>,
        dense: Arc<dyn Retriever>,
        config: &RetrievalConfig,
    ) -> Result<Self> {
        config.validate()?;
        let fusion = ReciprocalRankFusion::new(config.rrf_k)
            .with_weight(RankSource::Lexical, config.lexical_weight)
            .with_weight(RankSource::Dense, config.dense_weight);

        Ok(Self::new(lexical, dense)
            .with_fusion(fusion)
            .with_headroom(config.headroom))
    }

    /// Replace the fusion strategy.
    #[must_use]
    pub fn with_fusion(mut self, fusion: ReciprocalRankFusion) -> Self {
        self.fusion = fusion;
        self
    }

    /// Over-fetch factor for each sub-retriever (at least 1).
    #[must_use]
    pub fn with_headroom(mut self, headroom: usize) -> Self {
        self.headroom = headroom.max(1);
        self
    }

    /// Rerank fused results before truncation.
    #[must_use]
    pub fn with_reranker(mut self, reranker: Arc<dyn Reranker>) -> Self {
        self.reranker = Some(reranker);
        self
    }

    /// Fusion strategy in use.
    pub fn fusion(&self) -> &ReciprocalRankFusion {
        &self.fusion
    }
}

#[async_trait]
impl Retriever for HybridRetriever {
    #[instrument(skip(self))]
    async fn retrieve(&self, query: &str, limit: usize) -> Result<Vec<RetrievalResult>> {
        if limit == 0 {
            return Ok(Vec::new());
        }

        let fetch = limit.saturating_mul(self.headroom).max(limit);
        let (lexical, dense) = tokio::try_join!(
            self.lexical.retrieve(query, fetch),
            self.dense.retrieve(query, fetch)
        )?;
        debug!(
            "Sub-retrievers returned {} lexical and {} dense results",
            lexical.len(),
            dense.len()
        );

        let mut fused = self.fusion.fuse(vec![
            (RankSource::Lexical, lexical),
            (RankSource::Dense, dense),
        ]);

        if let Some(reranker) = &self.reranker {
            fused = reranker.rerank(query, fused).await?;
            debug!("Reranked with {}", reranker.name());
        }
        fused.truncate(limit);

        info!("Hybrid retrieval returned {} results", fused.len());
        Ok(fused)
    }

    fn name(&self) -> &'static str {
        "hybrid"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lectern_core::{LecternError, Material};
    use std::sync::Mutex;

    #[derive(Debug)]
    struct FixedRetriever {
        ids: Vec<&'static str>,
        requested: Mutex<Vec<usize>>,
    }

    impl FixedRetriever {
        fn new(ids: Vec<&'static str>) -> Self {
            Self {
                ids,
                requested: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl Retriever for FixedRetriever {
        async fn retrieve(&self, _query: &str, limit: usize) -> Result<Vec<RetrievalResult>> {
            self.requested.lock().unwrap().push(limit);
            Ok(self
                .ids
                .iter()
                .take(limit)
                .map(|id| RetrievalResult::new(Arc::new(Material::new(*id, "c", *id, "")), 1.0))
                .collect())
        }
    }

    #[derive(Debug)]
    struct FailingRetriever;

    #[async_trait]
    impl Retriever for FailingRetriever {
        async fn retrieve(&self, _query: &str, _limit: usize) -> Result<Vec<RetrievalResult>> {
            Err(LecternError::embedding("backend down"))
        }
    }

    #[derive(Debug)]
    struct ReverseReranker;

    #[async_trait]
    impl Reranker for ReverseReranker {
        async fn rerank(
            &self,
            _query: &str,
            mut results: Vec<RetrievalResult>,
        ) -> Result<Vec<RetrievalResult>> {
            results.reverse();
            Ok(results)
        }
    }

    #[tokio::test]
    async fn test_fuses_and_truncates() {
        let lexical = Arc::new(FixedRetriever::new(vec!["a", "b", "c"]));
        let dense = Arc::new(FixedRetriever::new(vec!["c", "d", "b"]));
        let hybrid = HybridRetriever::new(lexical.clone(), dense.clone());

        let results = hybrid.retrieve("q", 2).await.unwrap();
        assert_eq!(results.len(), 2);
        // "c" and "b" appear in both lists.
        let ids: Vec<&str> = results.iter().map(RetrievalResult::id).collect();
        assert!(ids.contains(&"c") && ids.contains(&"b"));

        assert_eq!(*lexical.requested.lock().unwrap(), vec![4]);
        assert_eq!(*dense.requested.lock().unwrap(), vec![4]);
    }

    #[tokio::test]
    async fn test_no_duplicate_ids() {
        let hybrid = HybridRetriever::new(
            Arc::new(FixedRetriever::new(vec!["a", "b"])),
            Arc::new(FixedRetriever::new(vec!["b", "a"])),
        );
        let results = hybrid.retrieve("q", 10).await.unwrap();
        assert_eq!(results.len(), 2);
    }

    #[tokio::test]
    async fn test_sub_retriever_error_propagates() {
        let hybrid = HybridRetriever::new(
            Arc::new(FixedRetriever::new(vec!["a"])),
            Arc::new(FailingRetriever),
        );
        let err = hybrid.retrieve("q", 3).await.unwrap_err();
        assert!(matches!(err, LecternError::Embedding { .. }));
    }

    #[tokio::test]
    async fn test_reranker_applied_before_truncation() {
        let hybrid = HybridRetriever::new(
            Arc::new(FixedRetriever::new(vec!["a", "b", "c"])),
            Arc::new(FixedRetriever::new(vec![])),
        )
        .with_reranker(Arc::new(ReverseReranker));

        let results = hybrid.retrieve("q", 1).await.unwrap();
        assert_eq!(results[0].id(), "b");
    }
}
