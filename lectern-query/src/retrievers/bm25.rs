//! BM25 retriever over an immutable course corpus.
//!
//! Corpus statistics are computed once at construction and never updated, so
//! the retriever is read-only and can be shared freely behind an `Arc`.

use async_trait::async_trait;
use lectern_core::{
    Material, Result, RetrievalResult, config::Bm25Params, traits::Retriever, utils::tokenize,
};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Added inside the IDF logarithm so terms present in every document stay finite.
const IDF_EPSILON: f32 = 1e-10;

/// Per-document statistics.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocumentStats {
    /// Document length in tokens.
    pub length: usize,

    /// Term frequencies in the document.
    pub term_frequencies: HashMap<String, usize>,
}

impl DocumentStats {
    fn from_tokens(tokens: &[String]) -> Self {
        let mut term_frequencies = HashMap::new();
        for token in tokens {
            *term_frequencies.entry(token.clone()).or_insert(0) += 1;
        }
        Self {
            length: tokens.len(),
            term_frequencies,
        }
    }

    /// Frequency of `term` in this document.
    pub fn tf(&self, term: &str) -> usize {
        self.term_frequencies.get(term).copied().unwrap_or(0)
    }
}

/// Corpus-wide statistics for BM25 scoring.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CorpusStats {
    /// Number of documents.
    pub document_count: usize,

    /// Mean document length in tokens.
    pub average_length: f32,

    /// Number of documents containing each term.
    pub document_frequency: HashMap<String, usize>,

    /// Statistics per document, aligned with the material order.
    pub documents: Vec<DocumentStats>,
}

impl CorpusStats {
    /// Compute statistics for `materials`.
    pub fn build(materials: &[Arc<Material>]) -> Self {
        let documents: Vec<DocumentStats> = materials
            .iter()
            .map(|material| DocumentStats::from_tokens(&tokenize(&material.searchable_text())))
            .collect();

        let mut document_frequency: HashMap<String, usize> = HashMap::new();
        for doc in &documents {
            for term in doc.term_frequencies.keys() {
                *document_frequency.entry(term.clone()).or_insert(0) += 1;
            }
        }

        let total_length: usize = documents.iter().map(|doc| doc.length).sum();
        let average_length = if documents.is_empty() {
            0.0
        } else {
            total_length as f32 / documents.len() as f32
        };

        Self {
            document_count: documents.len(),
            average_length,
            document_frequency,
            documents,
        }
    }

    /// Non-negative inverse document frequency of `term`.
    pub fn idf(&self, term: &str) -> f32 {
        let n = self.document_count as f32;
        let df = self.document_frequency.get(term).copied().unwrap_or(0) as f32;
        ((n - df + 0.5) / (df + 0.5) + IDF_EPSILON).ln().max(0.0)
    }
}

/// A lexical retriever ranking materials with Okapi BM25.
///
/// # Examples
///
/// ```rust
/// use lectern_core::{Material, config::Bm25Params, traits::Retriever};
/// use lectern_query::retrievers::Bm25Retriever;
/// use std::sync::Arc;
///
/// # #[tokio::main]
/// # async fn main() -> lectern_core::Result<()> {
/// let materials = vec![
///     Arc::new(Material::new("m1", "cs101", "Recursion", "A function that calls itself")),
///     Arc::new(Material::new("m2", "cs101", "Loops", "Iteration with for and while")),
/// ];
/// let retriever = Bm25Retriever::new(materials, Bm25Params::default())?;
///
/// let results = retriever.retrieve("recursion", 5).await?;
/// assert_eq!(results[0].id(), "m1");
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Bm25Retriever {
    materials: Vec<Arc<Material>>,
    stats: CorpusStats,
    params: Bm25Params,
}

impl Bm25Retriever {
    /// Index `materials`. Fails if `params` are out of range.
    pub fn new(materials: Vec<Arc<Material>>, params: Bm25Params) -> Result<Self> {
        params.validate()?;

        let stats = CorpusStats::build(&materials);
        info!(
            "Built BM25 index: {} documents, {} terms, avg length {:.1}",
            stats.document_count,
            stats.document_frequency.len(),
            stats.average_length
        );

        Ok(Self {
            materials,
            stats,
            params,
        })
    }

    /// Corpus statistics.
    pub fn stats(&self) -> &CorpusStats {
        &self.stats
    }

    /// Number of indexed documents.
    pub fn document_count(&self) -> usize {
        self.stats.document_count
    }

    /// BM25 parameters in use.
    pub fn params(&self) -> Bm25Params {
        self.params
    }

    fn term_score(&self, term: &str, doc: &DocumentStats) -> f32 {
        let tf = doc.tf(term) as f32;
        if tf == 0.0 {
            return 0.0;
        }

        let Bm25Params { k1, b } = self.params;
        let length_ratio = doc.length as f32 / self.stats.average_length;
        let normalized_tf = (tf * (k1 + 1.0)) / (tf + k1 * (1.0 - b + b * length_ratio));
        self.stats.idf(term) * normalized_tf
    }

    /// Score every document sharing at least one term with `query_terms`.
    fn search(&self, query_terms: &[String]) -> Vec<(usize, f32, Vec<String>)> {
        let mut hits = Vec::new();

        for (index, doc) in self.stats.documents.iter().enumerate() {
            let matched: Vec<String> = query_terms
                .iter()
                .filter(|term| doc.tf(term) > 0)
                .cloned()
                .collect();
            if matched.is_empty() {
                continue;
            }

            let score = matched.iter().map(|term| self.term_score(term, doc)).sum();
            hits.push((index, score, matched));
        }

        hits
    }
}

#[async_trait]
impl Retriever for Bm25Retriever {
    #[instrument(skip(self), fields(documents = self.stats.document_count))]
    async fn retrieve(&self, query: &str, limit: usize) -> Result<Vec<RetrievalResult>> {
        if limit == 0 || self.materials.is_empty() {
            return Ok(Vec::new());
        }

        let mut seen = HashSet::new();
        let query_terms: Vec<String> = tokenize(query)
            .into_iter()
            .filter(|term| seen.insert(term.clone()))
            .collect();
        if query_terms.is_empty() {
            debug!("Query has no indexable terms");
            return Ok(Vec::new());
        }

        let mut results: Vec<RetrievalResult> = self
            .search(&query_terms)
            .into_iter()
            .map(|(index, score, matched)| {
                RetrievalResult::new(Arc::clone(&self.materials[index]), score)
                    .with_matched_terms(matched)
                    .with_metadata("retriever", "bm25")
            })
            .collect();

        results.sort_by(|a, b| {
            b.score
                .total_cmp(&a.score)
                .then_with(|| a.material.id.cmp(&b.material.id))
        });
        results.truncate(limit);

        debug!("BM25 returned {} results", results.len());
        Ok(results)
    }

    fn name(&self) -> &'static str {
        "bm25"
    }
}
