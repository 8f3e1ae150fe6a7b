//! Embedding generation trait.
//!
//! The engine never hosts a model; embeddings come from an injected provider.

use async_trait::async_trait;

use crate::Result;

/// Turns text into a fixed-dimension dense vector.
///
/// # Examples
///
/// ```rust,no_run
/// use lectern_core::traits::Embedder;
/// use lectern_core::Result;
/// use async_trait::async_trait;
///
/// #[derive(Debug)]
/// struct ConstantEmbedder {
///     dimension: usize,
/// }
///
/// #[async_trait]
/// impl Embedder for ConstantEmbedder {
///     async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
///         Ok(vec![0.1; self.dimension])
///     }
///
///     fn dimension(&self) -> usize {
///         self.dimension
///     }
/// }
/// ```
#[async_trait]
pub trait Embedder: Send + Sync + std::fmt::Debug {
    /// Generate an embedding for a single text.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider fails. No retries are attempted by
    /// callers inside the engine.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Generate embeddings for several texts.
    ///
    /// The default implementation embeds sequentially.
    async fn embed_batch(&self, texts: Vec<&str>) -> Result<Vec<Vec<f32>>> {
        let mut embeddings = Vec::with_capacity(texts.len());
        for text in texts {
            embeddings.push(self.embed(text).await?);
        }
        Ok(embeddings)
    }

    /// Dimension of the produced vectors.
    fn dimension(&self) -> usize;

    /// Get a human-readable name for this embedder.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}
