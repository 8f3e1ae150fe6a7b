//! Integration tests wiring the local backends into the query stack.

use std::sync::Arc;

use lectern_core::{Material, config::Bm25Params, traits::Retriever, traits::VectorStore};
use lectern_integrations::{HashingEmbedder, InMemoryVectorStore};
use lectern_query::retrievers::{Bm25Retriever, DenseRetriever, HybridRetriever};

fn corpus() -> Vec<Arc<Material>> {
    vec![
        Arc::new(Material::new(
            "heap",
            "cs201",
            "Heaps",
            "A binary heap keeps the smallest key at the root of a complete tree",
        )),
        Arc::new(Material::new(
            "hash",
            "cs201",
            "Hash Tables",
            "Hash tables map keys to buckets and resolve collisions by chaining",
        )),
        Arc::new(Material::new(
            "bfs",
            "cs201",
            "Breadth-First Search",
            "Breadth-first search explores a graph level by level with a queue",
        )),
    ]
}

#[tokio::test]
async fn test_dense_retrieval_with_local_backends() {
    let store = Arc::new(InMemoryVectorStore::new());
    let dense = DenseRetriever::new(corpus(), Arc::new(HashingEmbedder::default()), store.clone());

    let results = dense.retrieve("hash collisions chaining", 3).await.unwrap();
    assert_eq!(results[0].id(), "hash");
    assert_eq!(store.len().await.unwrap(), 3);
    assert_eq!(store.dimension().await, Some(256));
}

#[tokio::test]
async fn test_hybrid_retrieval_with_local_backends() {
    let materials = corpus();
    let lexical = Arc::new(Bm25Retriever::new(materials.clone(), Bm25Params::default()).unwrap());
    let dense = Arc::new(DenseRetriever::new(
        materials,
        Arc::new(HashingEmbedder::default()),
        Arc::new(InMemoryVectorStore::new()),
    ));
    let hybrid = HybridRetriever::new(lexical, dense);

    let results = hybrid.retrieve("graph queue level", 2).await.unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0].id(), "bfs");
}

#[tokio::test]
async fn test_store_rejects_foreign_dimension() {
    let store = InMemoryVectorStore::with_dimension(256).unwrap();
    let dense = DenseRetriever::new(
        corpus(),
        Arc::new(HashingEmbedder::new(64).unwrap()),
        Arc::new(store),
    );
    let err = dense.retrieve("heap", 1).await.unwrap_err();
    assert!(err.is_client_error());
}
