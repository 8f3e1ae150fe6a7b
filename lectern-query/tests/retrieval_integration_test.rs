//! Integration tests for hybrid retrieval over a small course corpus.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use lectern_core::{
    Material, Result, RetrievalResult,
    config::{Bm25Params, RetrievalConfig},
    traits::{Embedder, Retriever, VectorStore},
    utils::{cosine_similarity, tokenize},
};
use lectern_query::{
    postprocessor::MmrDiversifier,
    retrievers::{Bm25Retriever, DenseRetriever, HybridRetriever},
};
use tokio::sync::RwLock;

const VOCABULARY: &[&str] = &["recursion", "loop", "sort", "graph", "stack", "tree"];

/// Bag-of-words embedder over a fixed vocabulary.
#[derive(Debug)]
struct VocabularyEmbedder;

#[async_trait]
impl Embedder for VocabularyEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let tokens = tokenize(text);
        Ok(VOCABULARY
            .iter()
            .map(|word| tokens.iter().filter(|t| t.starts_with(word)).count() as f32)
            .collect())
    }

    fn dimension(&self) -> usize {
        VOCABULARY.len()
    }

    fn name(&self) -> &'static str {
        "vocabulary"
    }
}

/// Exhaustive cosine search over a locked map.
#[derive(Debug, Default)]
struct MapStore {
    vectors: RwLock<HashMap<String, Vec<f32>>>,
}

#[async_trait]
impl VectorStore for MapStore {
    async fn add(&self, id: String, vector: Vec<f32>) -> Result<()> {
        self.vectors.write().await.insert(id, vector);
        Ok(())
    }

    async fn search(&self, query: &[f32], top_k: usize) -> Result<Vec<(String, f32)>> {
        let vectors = self.vectors.read().await;
        let mut scored = Vec::with_capacity(vectors.len());
        for (id, vector) in vectors.iter() {
            scored.push((id.clone(), cosine_similarity(query, vector)?));
        }
        scored.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        scored.truncate(top_k);
        Ok(scored)
    }

    async fn get(&self, id: &str) -> Result<Option<Vec<f32>>> {
        Ok(self.vectors.read().await.get(id).cloned())
    }

    async fn has(&self, id: &str) -> Result<bool> {
        Ok(self.vectors.read().await.contains_key(id))
    }

    async fn clear(&self) -> Result<()> {
        self.vectors.write().await.clear();
        Ok(())
    }

    async fn len(&self) -> Result<usize> {
        Ok(self.vectors.read().await.len())
    }
}

fn corpus() -> Vec<Arc<Material>> {
    [
        ("rec", "Recursion", "Recursion solves a problem through smaller recursion calls on the stack"),
        ("loops", "Loops", "A loop repeats work; every loop needs an exit condition"),
        ("sorting", "Sorting", "Merge sort and quick sort are comparison sort algorithms"),
        ("graphs", "Graphs", "Graph traversal visits graph vertices breadth or depth first"),
        ("trees", "Trees", "A tree is a graph without cycles; tree traversal may use recursion"),
    ]
    .into_iter()
    .map(|(id, title, content)| Arc::new(Material::new(id, "cs101", title, content)))
    .collect()
}

fn ids(results: &[RetrievalResult]) -> Vec<&str> {
    results.iter().map(RetrievalResult::id).collect()
}

#[tokio::test]
async fn test_bm25_ranks_term_dense_material_first() {
    let bm25 = Bm25Retriever::new(corpus(), Bm25Params::default()).unwrap();

    let results = bm25.retrieve("recursion", 5).await.unwrap();
    assert_eq!(ids(&results), vec!["rec", "trees"]);
    assert!(results[0].score > results[1].score);
    assert_eq!(results[0].matched_terms, vec!["recursion".to_string()]);

    assert!(bm25.retrieve("quantum entanglement", 5).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_dense_retriever_embeds_lazily() {
    let store = Arc::new(MapStore::default());
    let dense = DenseRetriever::new(corpus(), Arc::new(VocabularyEmbedder), store.clone());
    assert!(!dense.is_initialized());

    let results = dense.retrieve("sort algorithms", 2).await.unwrap();
    assert!(dense.is_initialized());
    assert_eq!(store.len().await.unwrap(), 5);
    assert_eq!(results[0].id(), "sorting");

    // Initialization runs once; later calls report the first count.
    assert_eq!(dense.initialize().await.unwrap(), 5);
}

#[tokio::test]
async fn test_hybrid_prefers_materials_found_by_both() {
    let materials = corpus();
    let lexical = Arc::new(Bm25Retriever::new(materials.clone(), Bm25Params::default()).unwrap());
    let dense = Arc::new(DenseRetriever::new(
        materials,
        Arc::new(VocabularyEmbedder),
        Arc::new(MapStore::default()),
    ));
    let hybrid = HybridRetriever::from_config(lexical, dense, &RetrievalConfig::default()).unwrap();

    let results = hybrid.retrieve("graph traversal", 3).await.unwrap();
    assert_eq!(results.len(), 3);
    assert_eq!(results[0].id(), "graphs");
    assert_eq!(results[0].metadata["retriever"], "hybrid");
    assert_eq!(results[0].metadata["lexical_rank"], 1);
    for pair in results.windows(2) {
        assert!(pair[0].score >= pair[1].score);
    }
}

#[tokio::test]
async fn test_mmr_spreads_near_duplicates() {
    let near_duplicate = |id: &str| {
        Arc::new(Material::new(
            id,
            "cs101",
            "Recursion",
            "recursion recursion base case stack frames",
        ))
    };
    let results = vec![
        RetrievalResult::new(near_duplicate("a"), 1.0),
        RetrievalResult::new(near_duplicate("b"), 0.95),
        RetrievalResult::new(
            Arc::new(Material::new("c", "cs101", "Sorting", "merge sort divides arrays")),
            0.9,
        ),
    ];

    let diversified = MmrDiversifier::default()
        .diversify(results, 2, None)
        .unwrap();
    assert_eq!(ids(&diversified), vec!["a", "c"]);
}
