//! Vector storage trait.

use async_trait::async_trait;

use crate::Result;

/// Similarity-searchable store of material id to embedding.
#[async_trait]
pub trait VectorStore: Send + Sync + std::fmt::Debug {
    /// Insert or replace the vector for `id`.
    ///
    /// # Errors
    ///
    /// Returns `DimensionMismatch` if the vector does not match the store's
    /// dimension.
    async fn add(&self, id: String, vector: Vec<f32>) -> Result<()>;

    /// Return up to `top_k` `(id, similarity)` pairs, most similar first.
    ///
    /// # Errors
    ///
    /// Returns `DimensionMismatch` if the query vector does not match the
    /// store's dimension.
    async fn search(&self, query: &[f32], top_k: usize) -> Result<Vec<(String, f32)>>;

    /// Fetch the stored vector for `id`.
    async fn get(&self, id: &str) -> Result<Option<Vec<f32>>>;

    /// Whether a vector is stored for `id`.
    async fn has(&self, id: &str) -> Result<bool>;

    /// Remove every vector.
    async fn clear(&self) -> Result<()>;

    /// Number of stored vectors.
    async fn len(&self) -> Result<usize>;

    /// Whether the store is empty.
    async fn is_empty(&self) -> Result<bool> {
        Ok(self.len().await? == 0)
    }

    /// Get a human-readable name for this store.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}
