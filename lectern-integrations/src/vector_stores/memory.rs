//! In-memory vector store implementation.
//!
//! Keeps every vector in a `HashMap` behind an async lock and answers
//! searches with an exhaustive cosine scan. Suitable for course-sized corpora,
//! development and tests.

use async_trait::async_trait;
use lectern_core::{LecternError, Result, traits::VectorStore, utils::cosine_similarity};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Operation counters for an [`InMemoryVectorStore`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreStats {
    /// Vectors currently stored.
    pub vectors: usize,
    /// Successful `add` calls.
    pub insert_operations: u64,
    /// Successful `search` calls.
    pub search_operations: u64,
}

#[derive(Debug, Default)]
struct Inner {
    dimension: Option<usize>,
    vectors: HashMap<String, Vec<f32>>,
    stats: StoreStats,
}

/// In-memory vector store ranking by cosine similarity.
///
/// The dimension is either fixed at construction or taken from the first
/// vector added. Vectors or queries of any other length are rejected with
/// [`LecternError::DimensionMismatch`].
///
/// # Examples
///
/// ```rust
/// use lectern_core::traits::VectorStore;
/// use lectern_integrations::InMemoryVectorStore;
///
/// # #[tokio::main]
/// # async fn main() -> lectern_core::Result<()> {
/// let store = InMemoryVectorStore::new();
/// store.add("m1".to_string(), vec![1.0, 0.0]).await?;
/// store.add("m2".to_string(), vec![0.0, 1.0]).await?;
///
/// let hits = store.search(&[0.9, 0.1], 1).await?;
/// assert_eq!(hits[0].0, "m1");
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Default)]
pub struct InMemoryVectorStore {
    inner: RwLock<Inner>,
}

impl InMemoryVectorStore {
    /// Create a store whose dimension is set by the first insert.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store accepting only `dimension`-length vectors.
    pub fn with_dimension(dimension: usize) -> Result<Self> {
        if dimension == 0 {
            return Err(LecternError::configuration(
                "Vector store dimension must be positive",
            ));
        }
        info!("Creating InMemoryVectorStore with dimension {}", dimension);
        Ok(Self {
            inner: RwLock::new(Inner {
                dimension: Some(dimension),
                ..Inner::default()
            }),
        })
    }

    /// The fixed dimension, if known yet.
    pub async fn dimension(&self) -> Option<usize> {
        self.inner.read().await.dimension
    }

    /// Operation counters.
    pub async fn stats(&self) -> StoreStats {
        self.inner.read().await.stats
    }

    /// Remove a vector. Returns whether it was present.
    pub async fn remove(&self, id: &str) -> bool {
        let mut inner = self.inner.write().await;
        let removed = inner.vectors.remove(id).is_some();
        inner.stats.vectors = inner.vectors.len();
        removed
    }
}

#[async_trait]
impl VectorStore for InMemoryVectorStore {
    async fn add(&self, id: String, vector: Vec<f32>) -> Result<()> {
        if vector.is_empty() {
            return Err(LecternError::validation("Cannot store an empty vector"));
        }

        let mut inner = self.inner.write().await;
        match inner.dimension {
            Some(expected) if expected != vector.len() => {
                return Err(LecternError::dimension_mismatch(expected, vector.len()));
            }
            Some(_) => {}
            None => {
                debug!("Store dimension fixed at {}", vector.len());
                inner.dimension = Some(vector.len());
            }
        }

        inner.vectors.insert(id, vector);
        inner.stats.vectors = inner.vectors.len();
        inner.stats.insert_operations += 1;
        Ok(())
    }

    async fn search(&self, query: &[f32], top_k: usize) -> Result<Vec<(String, f32)>> {
        let mut inner = self.inner.write().await;
        if let Some(expected) = inner.dimension {
            if expected != query.len() {
                return Err(LecternError::dimension_mismatch(expected, query.len()));
            }
        }
        if top_k == 0 || inner.vectors.is_empty() {
            return Ok(Vec::new());
        }

        let mut scored = Vec::with_capacity(inner.vectors.len());
        for (id, vector) in &inner.vectors {
            scored.push((id.clone(), cosine_similarity(query, vector)?));
        }
        scored.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        scored.truncate(top_k);

        inner.stats.search_operations += 1;
        debug!("Search returned {} of {} vectors", scored.len(), inner.vectors.len());
        Ok(scored)
    }

    async fn get(&self, id: &str) -> Result<Option<Vec<f32>>> {
        Ok(self.inner.read().await.vectors.get(id).cloned())
    }

    async fn has(&self, id: &str) -> Result<bool> {
        Ok(self.inner.read().await.vectors.contains_key(id))
    }

    async fn clear(&self) -> Result<()> {
        let mut inner = self.inner.write().await;
        inner.vectors.clear();
        inner.stats.vectors = 0;
        info!("Cleared InMemoryVectorStore");
        Ok(())
    }

    async fn len(&self) -> Result<usize> {
        Ok(self.inner.read().await.vectors.len())
    }

    fn name(&self) -> &'static str {
        "in_memory"
    }
}
