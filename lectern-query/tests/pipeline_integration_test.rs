//! Integration tests for the assembled adaptive pipeline.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use lectern_core::{
    DocumentHierarchy, GroundingLevel, HierarchyNode, Material, Result, RoutingAction,
    config::LecternConfig,
    traits::{CompletionModel, CompletionRequest, CompletionResponse, Embedder, VectorStore},
    utils::{cosine_similarity, tokenize},
};
use lectern_query::pipeline::AdaptivePipeline;
use tokio::sync::RwLock;

const VOCABULARY: &[&str] = &["recursion", "loop", "sort", "graph", "stack", "tree"];

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
}

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

/// Judge with a canned reply.
#[derive(Debug)]
struct CannedJudge(&'static str);

#[async_trait]
impl CompletionModel for CannedJudge {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse> {
        assert!(request.user_prompt.contains("ANSWER TO VERIFY"));
        Ok(CompletionResponse::ok(self.0))
    }
}

fn corpus() -> Vec<Arc<Material>> {
    [
        ("rec", "cs101", "Recursion", "Recursion solves a problem through smaller recursion calls on the stack"),
        ("loops", "cs101", "Loops", "A loop repeats work; every loop needs an exit condition"),
        ("sorting", "cs101", "Sorting", "Merge sort and quick sort are comparison sort algorithms"),
        ("graphs", "cs201", "Graphs", "Graph traversal visits graph vertices breadth or depth first"),
        ("trees", "cs201", "Trees", "A tree is a graph without cycles; tree traversal may use recursion"),
    ]
    .into_iter()
    .map(|(id, course, title, content)| Arc::new(Material::new(id, course, title, content)))
    .collect()
}

fn hierarchy() -> DocumentHierarchy {
    DocumentHierarchy::builder()
        .root(
            HierarchyNode::new("structures", vec![0.0, 0.0, 0.0, 1.0, 0.0, 1.0], 0)
                .with_children(["graph-topic", "tree-topic"]),
        )
        .node(
            HierarchyNode::new("graph-topic", vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0], 1)
                .with_materials(["graphs"]),
        )
        .node(
            HierarchyNode::new("tree-topic", vec![0.0, 0.0, 0.0, 0.0, 0.0, 1.0], 1)
                .with_materials(["trees"]),
        )
        .build()
        .unwrap()
}

fn pipeline(judge: &'static str) -> AdaptivePipeline {
    AdaptivePipeline::from_config(
        &LecternConfig::default(),
        corpus(),
        Arc::new(VocabularyEmbedder),
        Arc::new(MapStore::default()),
        Arc::new(CannedJudge(judge)),
        Some(hierarchy()),
    )
    .unwrap()
}

const GROUNDED: &str = r#"```json
{"supported_claims":[{"claim":"Merge sort is a comparison sort","supporting_materials":[1],"confidence":0.9}],"unsupported_claims":[]}
```"#;

#[tokio::test]
async fn test_end_to_end_retrieval() {
    let pipeline = pipeline(GROUNDED);

    let response = pipeline
        .retrieve("How does merge sort work?", None, Some(3), &[])
        .await
        .unwrap();
    assert!(!response.from_cache);
    assert!(response.results.len() <= 3);
    assert_eq!(response.results[0].id(), "sorting");
}

#[tokio::test]
async fn test_course_filter_applies() {
    let pipeline = pipeline(GROUNDED);

    let response = pipeline
        .retrieve("How does graph traversal work?", Some("cs201"), Some(5), &[])
        .await
        .unwrap();
    assert!(!response.results.is_empty());
    assert!(response.results.iter().all(|r| r.material.course_id == "cs201"));
}

#[tokio::test]
async fn test_high_confidence_query_is_served_from_cache() {
    let pipeline = pipeline(GROUNDED);
    let query = "What is recursion in trees?";

    let first = pipeline.retrieve(query, None, None, &[]).await.unwrap();
    assert_eq!(first.decision.confidence.level, lectern_core::ConfidenceLevel::High);
    assert_eq!(first.decision.cache_key.as_deref(), Some("what-is-recursion-in-trees"));

    let second = pipeline
        .retrieve("what is recursion in TREES", None, None, &[])
        .await
        .unwrap();
    assert!(second.from_cache);
    assert_eq!(second.decision.action, RoutingAction::UseCache);
    assert_eq!(
        second.results.iter().map(|r| r.id()).collect::<Vec<_>>(),
        first.results.iter().map(|r| r.id()).collect::<Vec<_>>()
    );

    let metrics = pipeline.router().metrics().await;
    assert_eq!(metrics.total_queries, 2);
    assert_eq!(metrics.cache_hits, 1);
}

#[tokio::test]
async fn test_low_confidence_query_walks_hierarchy() {
    let pipeline = pipeline(GROUNDED);

    let response = pipeline
        .retrieve("things about graph stuff", None, Some(2), &[])
        .await
        .unwrap();
    assert_eq!(response.decision.action, RoutingAction::RetrieveAggressive);
    assert!(response.decision.cache_key.is_none());

    let traversal = response.traversal.expect("aggressive routes traverse");
    assert!(traversal.nodes_visited >= 1);
}

#[tokio::test]
async fn test_verify_grounding_through_pipeline() {
    let pipeline = pipeline(GROUNDED);
    let response = pipeline
        .retrieve("How does merge sort work?", None, Some(1), &[])
        .await
        .unwrap();

    let result = pipeline
        .verify_grounding(
            "Merge sort is a comparison sort.",
            response.materials(),
            Some("How does merge sort work?"),
        )
        .await;
    assert!(result.is_grounded);
    assert_eq!(result.level, GroundingLevel::WellGrounded);
}

#[tokio::test]
async fn test_unparseable_judge_output_is_not_grounded() {
    let pipeline = pipeline("Sure, looks right to me!");
    let result = pipeline
        .verify_grounding("Anything.", corpus(), None)
        .await;
    assert!(!result.is_grounded);
    assert_eq!(result.claim_count(), 0);
}

#[test]
fn test_invalid_config_is_rejected() {
    let mut config = LecternConfig::default();
    config.retrieval.mmr_lambda = 1.5;

    let result = AdaptivePipeline::from_config(
        &config,
        corpus(),
        Arc::new(VocabularyEmbedder),
        Arc::new(MapStore::default()),
        Arc::new(CannedJudge(GROUNDED)),
        None,
    );
    assert!(result.is_err());
}
