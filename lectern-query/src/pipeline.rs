//! End-to-end adaptive retrieval pipeline.
//!
//! ```text
//! query → confidence → router ─ hit ──→ cached pool ─┐
//!                        └─ miss → hybrid retrieval ─┴→ course filter → MMR
//!                                   (pool cached)      → (aggressive) hierarchy traversal
//! ```

use lectern_core::{
    DocumentHierarchy, GroundingRequest, GroundingResult, LecternError, Material, Result,
    RetrievalResult, RoutingAction, RoutingDecision,
    config::LecternConfig,
    traits::{CompletionModel, Embedder, Retriever, VectorStore},
};
use futures::future::try_join_all;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, instrument};

use crate::{
    grounding::GroundingVerifier,
    hierarchical::{HierarchyTraverser, TraversalMetrics},
    postprocessor::MmrDiversifier,
    retrievers::{Bm25Retriever, DenseRetriever, HybridRetriever},
    routing::{AdaptiveRouter, HeuristicConfidenceScorer},
};

/// Candidate pool multiplier per routing action.
fn pool_multiplier(action: RoutingAction) -> usize {
    match action {
        RoutingAction::UseCache | RoutingAction::RetrieveStandard => 2,
        RoutingAction::RetrieveExpanded => 3,
        RoutingAction::RetrieveAggressive => 4,
    }
}

/// Hierarchy traversal used to widen aggressive retrievals.
#[derive(Debug)]
pub struct HierarchySearch {
    hierarchy: Arc<DocumentHierarchy>,
    traverser: HierarchyTraverser,
    embedder: Arc<dyn Embedder>,
    materials: HashMap<String, Arc<Material>>,
    embed_timeout: Duration,
}

impl HierarchySearch {
    /// Create a hierarchy search resolving leaf ids against `materials`.
    pub fn new(
        hierarchy: Arc<DocumentHierarchy>,
        traverser: HierarchyTraverser,
        embedder: Arc<dyn Embedder>,
        materials: &[Arc<Material>],
    ) -> Self {
        Self {
            hierarchy,
            traverser,
            embedder,
            materials: materials
                .iter()
                .map(|m| (m.id.clone(), Arc::clone(m)))
                .collect(),
            embed_timeout: Duration::from_secs(30),
        }
    }

    /// Bound the query embedding call by `timeout`.
    #[must_use]
    pub fn with_embed_timeout(mut self, timeout: Duration) -> Self {
        self.embed_timeout = timeout;
        self
    }

    async fn search(
        &self,
        query: &str,
    ) -> Result<(Vec<(Arc<Material>, f32, String)>, TraversalMetrics)> {
        let embedding = tokio::time::timeout(self.embed_timeout, self.embedder.embed(query))
            .await
            .map_err(|_| LecternError::timeout("hierarchy query embedding"))??;

        let traversal = self.traverser.traverse(&self.hierarchy, &embedding)?;
        let found = traversal
            .nodes
            .iter()
            .flat_map(|node| {
                node.material_ids.iter().filter_map(|id| {
                    self.materials
                        .get(id)
                        .map(|m| (Arc::clone(m), node.similarity, node.id.clone()))
                })
            })
            .collect();
        Ok((found, traversal.metrics))
    }
}

/// Result of one pipeline retrieval.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineResponse {
    /// Retrieved materials, best first.
    pub results: Vec<RetrievalResult>,
    /// The routing decision taken.
    pub decision: RoutingDecision,
    /// Whether results were served from cache.
    pub from_cache: bool,
    /// Traversal statistics when the hierarchy was searched.
    pub traversal: Option<TraversalMetrics>,
    /// Time spent in the pipeline.
    pub elapsed: Duration,
}

impl PipelineResponse {
    /// Materials of the results, in order.
    pub fn materials(&self) -> Vec<Arc<Material>> {
        self.results.iter().map(|r| Arc::clone(&r.material)).collect()
    }
}

/// Routes, retrieves, diversifies and caches course material lookups, and
/// verifies generated answers against them.
///
/// # Examples
///
/// ```rust,no_run
/// use lectern_core::{Material, config::LecternConfig};
/// use lectern_query::pipeline::AdaptivePipeline;
/// # use std::sync::Arc;
/// # async fn example(
/// #     materials: Vec<Arc<Material>>,
/// #     embedder: Arc<dyn lectern_core::traits::Embedder>,
/// #     store: Arc<dyn lectern_core::traits::VectorStore>,
/// #     judge: Arc<dyn lectern_core::traits::CompletionModel>,
/// # ) -> lectern_core::Result<()> {
/// let pipeline = AdaptivePipeline::from_config(
///     &LecternConfig::default(),
///     materials,
///     embedder,
///     store,
///     judge,
///     None,
/// )?;
///
/// let response = pipeline
///     .retrieve("How does merge sort work?", Some("cs101"), None, &[])
///     .await?;
/// println!("{} results via {}", response.results.len(), response.decision.action);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct AdaptivePipeline {
    router: AdaptiveRouter<Vec<RetrievalResult>>,
    retriever: Arc<dyn Retriever>,
    store: Arc<dyn VectorStore>,
    diversifier: MmrDiversifier,
    verifier: GroundingVerifier,
    hierarchy: Option<HierarchySearch>,
    default_limit: usize,
}

impl AdaptivePipeline {
    /// Start building a pipeline.
    pub fn builder() -> AdaptivePipelineBuilder {
        AdaptivePipelineBuilder::default()
    }

    /// Assemble the full stack from configuration.
    ///
    /// Builds a BM25 and a dense retriever over `materials`, fuses them, and
    /// derives the confidence vocabulary from material titles and keywords.
    pub fn from_config(
        config: &LecternConfig,
        materials: Vec<Arc<Material>>,
        embedder: Arc<dyn Embedder>,
        store: Arc<dyn VectorStore>,
        judge: Arc<dyn CompletionModel>,
        hierarchy: Option<DocumentHierarchy>,
    ) -> Result<Self> {
        config.validate()?;
        let retrieval = &config.retrieval;

        let lexical = Arc::new(Bm25Retriever::new(materials.clone(), retrieval.bm25)?);
        let dense = Arc::new(
            DenseRetriever::new(materials.clone(), Arc::clone(&embedder), Arc::clone(&store))
                .with_embed_timeout(retrieval.embed_timeout()),
        );
        let hybrid = HybridRetriever::from_config(lexical, dense, retrieval)?;

        let scorer =
            HeuristicConfidenceScorer::from_materials(&materials, config.router.thresholds)?;
        let router = AdaptiveRouter::with_memory_cache(Arc::new(scorer), config.router.clone())?;

        let mut builder = Self::builder()
            .router(router)
            .retriever(Arc::new(hybrid))
            .store(store)
            .diversifier(MmrDiversifier::new(retrieval.mmr_lambda)?)
            .verifier(GroundingVerifier::new(judge, config.verifier.clone())?)
            .default_limit(retrieval.default_limit);

        if let Some(hierarchy) = hierarchy {
            let traverser = HierarchyTraverser::new(config.traversal.clone())?;
            builder = builder.hierarchy(
                HierarchySearch::new(Arc::new(hierarchy), traverser, embedder, &materials)
                    .with_embed_timeout(retrieval.embed_timeout()),
            );
        }

        builder.build()
    }

    /// The router, for metrics and cache inspection.
    pub fn router(&self) -> &AdaptiveRouter<Vec<RetrievalResult>> {
        &self.router
    }

    /// Retrieve materials for `query`.
    ///
    /// `course_id` restricts results to one course; `limit` defaults to the
    /// configured default.
    #[instrument(skip(self, history), fields(history = history.len()))]
    pub async fn retrieve(
        &self,
        query: &str,
        course_id: Option<&str>,
        limit: Option<usize>,
        history: &[String],
    ) -> Result<PipelineResponse> {
        let started = Instant::now();
        let limit = limit.unwrap_or(self.default_limit);
        let outcome = self.router.route_query(query, history).await?;
        let decision = outcome.decision;

        if let Some(cached) = outcome.cached {
            let results = self.select(cached, course_id, limit).await?;
            info!("Served {} cached results", results.len());
            return Ok(PipelineResponse {
                results,
                decision,
                from_cache: true,
                traversal: None,
                elapsed: started.elapsed(),
            });
        }

        let pool = limit.saturating_mul(pool_multiplier(decision.action));
        let candidates = self.retriever.retrieve(query, pool).await?;

        // Cached unfiltered; hits re-apply the course filter and limit.
        if let Some(key) = &decision.cache_key {
            debug!("Caching {} candidates under {}", candidates.len(), key);
            self.router
                .cache_result(query, candidates.clone(), decision.confidence.level)
                .await;
        }

        let mut results = self.select(candidates, course_id, limit).await?;

        let mut traversal = None;
        if decision.aggressive {
            if let Some(hierarchy) = &self.hierarchy {
                let (found, metrics) = hierarchy.search(query).await?;
                let mut present: HashSet<String> =
                    results.iter().map(|r| r.id().to_string()).collect();

                for (material, similarity, node_id) in found {
                    if results.len() >= limit {
                        break;
                    }
                    if course_id.is_some_and(|c| material.course_id != c)
                        || !present.insert(material.id.clone())
                    {
                        continue;
                    }
                    results.push(
                        RetrievalResult::new(material, similarity)
                            .with_metadata("source", "hierarchy")
                            .with_metadata("hierarchy_node", node_id),
                    );
                }
                traversal = Some(metrics);
            }
        }

        info!(
            "Retrieved {} results via {} in {:?}",
            results.len(),
            decision.action,
            started.elapsed()
        );
        Ok(PipelineResponse {
            results,
            decision,
            from_cache: false,
            traversal,
            elapsed: started.elapsed(),
        })
    }

    /// Filter `candidates` to `course_id` and diversify them down to `limit`.
    async fn select(
        &self,
        candidates: Vec<RetrievalResult>,
        course_id: Option<&str>,
        limit: usize,
    ) -> Result<Vec<RetrievalResult>> {
        let candidates: Vec<RetrievalResult> = candidates
            .into_iter()
            .filter(|result| course_id.is_none_or(|c| result.material.course_id == c))
            .collect();
        debug!("{} candidates after course filter", candidates.len());

        let vectors = try_join_all(candidates.iter().map(|c| self.store.get(c.id()))).await?;
        let embeddings: HashMap<String, Vec<f32>> = candidates
            .iter()
            .zip(vectors)
            .filter_map(|(c, vector)| vector.map(|v| (c.id().to_string(), v)))
            .collect();
        let mut results = self
            .diversifier
            .diversify(candidates, limit, Some(&embeddings))?;
        results.truncate(limit);
        Ok(results)
    }

    /// Verify `answer` against `materials`.
    pub async fn verify_grounding(
        &self,
        answer: &str,
        materials: Vec<Arc<Material>>,
        question: Option<&str>,
    ) -> GroundingResult {
        let mut request = GroundingRequest::new(answer, materials);
        if let Some(question) = question {
            request = request.with_question(question);
        }
        self.verifier.verify(request).await
    }
}

/// Builder for [`AdaptivePipeline`].
#[derive(Debug, Default)]
pub struct AdaptivePipelineBuilder {
    router: Option<AdaptiveRouter<Vec<RetrievalResult>>>,
    retriever: Option<Arc<dyn Retriever>>,
    store: Option<Arc<dyn VectorStore>>,
    diversifier: Option<MmrDiversifier>,
    verifier: Option<GroundingVerifier>,
    hierarchy: Option<HierarchySearch>,
    default_limit: Option<usize>,
}

impl AdaptivePipelineBuilder {
    /// Set the router.
    #[must_use]
    pub fn router(mut self, router: AdaptiveRouter<Vec<RetrievalResult>>) -> Self {
        self.router = Some(router);
        self
    }

    /// Set the retriever, usually a [`HybridRetriever`].
    #[must_use]
    pub fn retriever(mut self, retriever: Arc<dyn Retriever>) -> Self {
        self.retriever = Some(retriever);
        self
    }

    /// Set the vector store supplying embeddings for diversification.
    #[must_use]
    pub fn store(mut self, store: Arc<dyn VectorStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Set the diversifier. Defaults to λ = 0.7.
    #[must_use]
    pub fn diversifier(mut self, diversifier: MmrDiversifier) -> Self {
        self.diversifier = Some(diversifier);
        self
    }

    /// Set the grounding verifier.
    #[must_use]
    pub fn verifier(mut self, verifier: GroundingVerifier) -> Self {
        self.verifier = Some(verifier);
        self
    }

    /// Enable hierarchy traversal for aggressive retrievals.
    #[must_use]
    pub fn hierarchy(mut self, hierarchy: HierarchySearch) -> Self {
        self.hierarchy = Some(hierarchy);
        self
    }

    /// Set the result count used when a call gives none. Defaults to 5.
    #[must_use]
    pub fn default_limit(mut self, limit: usize) -> Self {
        self.default_limit = Some(limit);
        self
    }

    /// Build the pipeline.
    pub fn build(self) -> Result<AdaptivePipeline> {
        let router = self
            .router
            .ok_or_else(|| LecternError::configuration("Router is required"))?;
        let retriever = self
            .retriever
            .ok_or_else(|| LecternError::configuration("Retriever is required"))?;
        let store = self
            .store
            .ok_or_else(|| LecternError::configuration("Vector store is required"))?;
        let verifier = self
            .verifier
            .ok_or_else(|| LecternError::configuration("Grounding verifier is required"))?;

        Ok(AdaptivePipeline {
            router,
            retriever,
            store,
            diversifier: self.diversifier.unwrap_or_default(),
            verifier,
            hierarchy: self.hierarchy,
            default_limit: self.default_limit.unwrap_or(5).max(1),
        })
    }
}
