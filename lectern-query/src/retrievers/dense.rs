//! Dense retriever backed by an injected embedder and vector store.

use async_trait::async_trait;
use lectern_core::{
    LecternError, Material, Result, RetrievalResult,
    traits::{Embedder, Retriever, VectorStore},
};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::OnceCell;
use tracing::{debug, info, instrument};

/// Default timeout for a single embedding call.
pub const DEFAULT_EMBED_TIMEOUT: Duration = Duration::from_secs(30);

/// Semantic retriever ranking materials by embedding similarity.
///
/// Materials are embedded lazily: the first call to [`retrieve`] (or an
/// explicit [`initialize`]) embeds every material not yet present in the
/// store. Concurrent first callers share a single initialization.
///
/// [`retrieve`]: Retriever::retrieve
/// [`initialize`]: DenseRetriever::initialize
#[derive(Debug)]
pub struct DenseRetriever {
    materials: Vec<Arc<Material>>,
    by_id: HashMap<String, Arc<Material>>,
    embedder: Arc<dyn Embedder>,
    store: Arc<dyn VectorStore>,
    embed_timeout: Duration,
    initialized: OnceCell<usize>,
}

impl DenseRetriever {
    /// Create a retriever over `materials`.
    pub fn new(
        materials: Vec<Arc<Material>>,
        embedder: Arc<dyn Embedder>,
        store: Arc<dyn VectorStore>,
    ) -> Self {
        let by_id = materials
            .iter()
            .map(|material| (material.id.clone(), Arc::clone(material)))
            .collect();

        Self {
            materials,
            by_id,
            embedder,
            store,
            embed_timeout: DEFAULT_EMBED_TIMEOUT,
            initialized: OnceCell::new(),
        }
    }

    /// Bound every embedding call by `timeout`.
    #[must_use]
    pub fn with_embed_timeout(mut self, timeout: Duration) -> Self {
        self.embed_timeout = timeout;
        self
    }

    /// The vector store holding material embeddings.
    pub fn store(&self) -> &Arc<dyn VectorStore> {
        &self.store
    }

    /// Whether initialization has completed.
    pub fn is_initialized(&self) -> bool {
        self.initialized.initialized()
    }

    /// Embed and store every material missing from the store.
    ///
    /// Runs at most once; later calls return immediately. Returns the number
    /// of materials embedded by the call that performed the work.
    #[instrument(skip(self), fields(materials = self.materials.len()))]
    pub async fn initialize(&self) -> Result<usize> {
        self.initialized
            .get_or_try_init(|| self.embed_missing())
            .await
            .copied()
    }

    async fn embed_missing(&self) -> Result<usize> {
        let mut missing = Vec::new();
        for material in &self.materials {
            if !self.store.has(&material.id).await? {
                missing.push(material);
            }
        }

        if missing.is_empty() {
            debug!("All {} materials already embedded", self.materials.len());
            return Ok(0);
        }

        let texts: Vec<String> = missing.iter().map(|m| m.searchable_text()).collect();
        let embeddings = tokio::time::timeout(
            self.embed_timeout,
            self.embedder
                .embed_batch(texts.iter().map(String::as_str).collect()),
        )
        .await
        .map_err(|_| {
            LecternError::timeout(format!(
                "embedding {} materials exceeded {:?}",
                missing.len(),
                self.embed_timeout
            ))
        })??;

        if embeddings.len() != missing.len() {
            return Err(LecternError::embedding(format!(
                "Embedder returned {} vectors for {} materials",
                embeddings.len(),
                missing.len()
            )));
        }

        for (material, embedding) in missing.iter().zip(embeddings) {
            self.store.add(material.id.clone(), embedding).await?;
        }

        info!(
            "Embedded {} materials with {}",
            missing.len(),
            self.embedder.name()
        );
        Ok(missing.len())
    }

    async fn embed_query(&self, query: &str) -> Result<Vec<f32>> {
        tokio::time::timeout(self.embed_timeout, self.embedder.embed(query))
            .await
            .map_err(|_| {
                LecternError::timeout(format!(
                    "query embedding exceeded {:?}",
                    self.embed_timeout
                ))
            })?
    }
}

#[async_trait]
impl Retriever for DenseRetriever {
    #[instrument(skip(self))]
    async fn retrieve(&self, query: &str, limit: usize) -> Result<Vec<RetrievalResult>> {
        self.initialize().await?;
        if limit == 0 {
            return Ok(Vec::new());
        }

        let query_embedding = self.embed_query(query).await?;
        let hits = self.store.search(&query_embedding, limit).await?;

        let results: Vec<RetrievalResult> = hits
            .into_iter()
            .filter_map(|(id, similarity)| {
                self.by_id.get(&id).map(|material| {
                    RetrievalResult::new(Arc::clone(material), similarity)
                        .with_metadata("retriever", "dense")
                })
            })
            .collect();

        debug!("Dense retrieval returned {} results", results.len());
        Ok(results)
    }

    fn name(&self) -> &'static str {
        "dense"
    }
}
