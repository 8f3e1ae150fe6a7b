//! Retrieval results and the ranked-list intermediate used by fusion.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use super::Material;

/// A material returned for a query, with its score and match details.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalResult {
    /// The matched material.
    pub material: Arc<Material>,

    /// Retriever specific relevance score (higher is better).
    pub score: f32,

    /// Query terms that matched the material, when the retriever knows them.
    #[serde(default)]
    pub matched_terms: Vec<String>,

    /// Free-form retriever metadata.
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
}

impl RetrievalResult {
    /// Create a new result with no matched terms or metadata.
    pub fn new(material: Arc<Material>, score: f32) -> Self {
        Self {
            material,
            score,
            matched_terms: Vec::new(),
            metadata: HashMap::new(),
        }
    }

    /// Set the matched terms.
    #[must_use]
    pub fn with_matched_terms(mut self, terms: Vec<String>) -> Self {
        self.matched_terms = terms;
        self
    }

    /// Add a metadata entry.
    #[must_use]
    pub fn with_metadata<K, V>(mut self, key: K, value: V) -> Self
    where
        K: Into<String>,
        V: Into<serde_json::Value>,
    {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Id of the underlying material.
    pub fn id(&self) -> &str {
        &self.material.id
    }
}

/// Which ranked list a [`RankedResult`] came from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RankSource {
    /// BM25 / keyword list.
    Lexical,
    /// Embedding similarity list.
    Dense,
    /// Any other named source.
    Named(String),
}

impl RankSource {
    /// Stable label used in metadata.
    pub fn label(&self) -> &str {
        match self {
            Self::Lexical => "lexical",
            Self::Dense => "dense",
            Self::Named(name) => name,
        }
    }
}

impl fmt::Display for RankSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A single entry of a ranked list, as consumed by rank fusion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedResult {
    /// Material id.
    pub id: String,

    /// 1-based rank within its source list.
    pub rank: usize,

    /// Score assigned by the source retriever.
    pub score: f32,

    /// The list this entry came from.
    pub source: RankSource,
}

impl RankedResult {
    /// Convert an ordered result list into ranked entries (ranks start at 1).
    pub fn from_results(results: &[RetrievalResult], source: &RankSource) -> Vec<Self> {
        results
            .iter()
            .enumerate()
            .map(|(index, result)| Self {
                id: result.material.id.clone(),
                rank: index + 1,
                score: result.score,
                source: source.clone(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ranks_are_one_based() {
        let a = Arc::new(Material::new("a", "c", "A", "alpha"));
        let b = Arc::new(Material::new("b", "c", "B", "beta"));
        let results = vec![RetrievalResult::new(a, 2.0), RetrievalResult::new(b, 1.0)];

        let ranked = RankedResult::from_results(&results, &RankSource::Lexical);
        assert_eq!(ranked[0].rank, 1);
        assert_eq!(ranked[1].rank, 2);
        assert_eq!(ranked[1].id, "b");
        assert_eq!(ranked[0].source.to_string(), "lexical");
    }
}
