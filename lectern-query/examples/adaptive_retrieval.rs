//! Adaptive retrieval example.
//!
//! Builds the full pipeline over a handful of course materials with mock
//! embedding, storage and judge backends, then routes queries of varying
//! confidence and verifies an answer.
//!
//! Run with `RUST_LOG=debug` to see routing and fusion details.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use lectern_core::utils::{cosine_similarity, tokenize};
use lectern_query::prelude::*;
use tokio::sync::RwLock;
use tracing::info;

const VOCABULARY: &[&str] = &["recursion", "loop", "sort", "graph", "stack", "tree", "hash"];

/// Mock embedder counting vocabulary terms.
#[derive(Debug)]
struct MockEmbedder;

#[async_trait]
impl Embedder for MockEmbedder {
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
        "mock-embedder"
    }
}

/// Mock vector store for demonstration purposes.
#[derive(Debug, Default)]
struct MockVectorStore {
    vectors: RwLock<HashMap<String, Vec<f32>>>,
}

#[async_trait]
impl VectorStore for MockVectorStore {
    async fn add(&self, id: String, vector: Vec<f32>) -> Result<()> {
        self.vectors.write().await.insert(id, vector);
        Ok(())
    }

    async fn search(&self, query: &[f32], top_k: usize) -> Result<Vec<(String, f32)>> {
        let vectors = self.vectors.read().await;
        let mut scored = Vec::new();
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

    fn name(&self) -> &'static str {
        "mock-store"
    }
}

/// Mock judge that supports every claim with the first source.
#[derive(Debug)]
struct MockJudge;

#[async_trait]
impl CompletionModel for MockJudge {
    async fn complete(&self, _request: CompletionRequest) -> Result<CompletionResponse> {
        Ok(CompletionResponse::ok(
            r#"{"supported_claims":[{"claim":"Merge sort divides the input","supporting_materials":[1],"confidence":0.9}],"unsupported_claims":[],"summary":"The answer matches the sorting lecture."}"#,
        ))
    }

    fn name(&self) -> &'static str {
        "mock-judge"
    }
}

fn materials() -> Vec<Arc<Material>> {
    vec![
        Arc::new(
            Material::new(
                "lec-01",
                "cs101",
                "Recursion",
                "A recursive function calls itself and needs a base case to stop the recursion.",
            )
            .with_type(MaterialType::Lecture)
            .with_keywords(["base case", "call stack"]),
        ),
        Arc::new(
            Material::new(
                "lec-02",
                "cs101",
                "Sorting",
                "Merge sort divides the input, sorts each half and merges the sorted halves.",
            )
            .with_type(MaterialType::Lecture)
            .with_keywords(["merge sort", "quick sort"]),
        ),
        Arc::new(
            Material::new(
                "lab-03",
                "cs101",
                "Hash Tables",
                "A hash table maps keys to buckets with a hash function.",
            )
            .with_type(MaterialType::Lab),
        ),
        Arc::new(
            Material::new(
                "lec-07",
                "cs201",
                "Graph Traversal",
                "Breadth-first graph traversal uses a queue; depth-first uses a stack.",
            )
            .with_type(MaterialType::Lecture)
            .with_keywords(["bfs", "dfs"]),
        ),
    ]
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    info!("Building adaptive pipeline");
    let pipeline = AdaptivePipeline::from_config(
        &LecternConfig::default(),
        materials(),
        Arc::new(MockEmbedder),
        Arc::new(MockVectorStore::default()),
        Arc::new(MockJudge),
        None,
    )?;

    let queries = [
        "What is the base case in recursion?",
        "what is the base case in RECURSION",
        "How does merge sort work?",
        "stuff",
    ];
    for query in queries {
        let response = pipeline.retrieve(query, Some("cs101"), Some(3), &[]).await?;
        println!("\n🔍 {query}");
        println!(
            "   {} (confidence {:.1}, cached: {})",
            response.decision.action, response.decision.confidence.score, response.from_cache
        );
        for (i, result) in response.results.iter().enumerate() {
            println!(
                "   {}. {} [{}] score {:.4}",
                i + 1,
                result.material.title,
                result.id(),
                result.score
            );
        }
    }

    let response = pipeline
        .retrieve("How does merge sort work?", Some("cs101"), Some(1), &[])
        .await?;
    let grounding = pipeline
        .verify_grounding(
            "Merge sort divides the input and merges sorted halves.",
            response.materials(),
            Some("How does merge sort work?"),
        )
        .await;
    println!(
        "\n✅ Grounding: {:.2} ({}), grounded: {}",
        grounding.score, grounding.level, grounding.is_grounded
    );
    println!("   {}", grounding.summary);

    let metrics = pipeline.router().metrics().await;
    println!(
        "\n📊 {} queries, cache hit rate {:.0}%",
        metrics.total_queries,
        metrics.cache_hit_rate() * 100.0
    );

    Ok(())
}
