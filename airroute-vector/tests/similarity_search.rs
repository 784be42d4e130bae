//! Similarity query engine against a real RocksDB store

mod common;

use std::sync::Arc;
use std::time::Duration;

use airroute_vector::{
    EmbeddingStore, IngestConfig, IngestMode, IngestPipeline, RouteId, SimilarityConfig,
    SimilarityEngine, VectorError,
};
use common::{counting_store, FixedEmbedder, HashEmbedder, SyntheticRoutes};

const A: RouteId = RouteId(1);
const B: RouteId = RouteId(2);
const C: RouteId = RouteId(3);

fn toy_store() -> (tempfile::TempDir, Arc<common::CountingStore>) {
    let (dir, store) = counting_store(2);
    store.upsert(A, Some("route a"), Some(&[1.0, 0.0])).unwrap();
    store.upsert(B, Some("route b"), Some(&[0.0, 1.0])).unwrap();
    store
        .upsert(C, Some("route c"), Some(&[0.707, 0.707]))
        .unwrap();
    (dir, store)
}

#[test]
fn test_similar_by_id_toy_scenario() {
    let (_dir, store) = toy_store();
    let engine = SimilarityEngine::new(
        store,
        Arc::new(FixedEmbedder::new(vec![1.0, 0.0])),
        SimilarityConfig::default(),
    );

    let neighbors = engine.similar_by_id(A, 2).unwrap();
    assert_eq!(neighbors.len(), 2);
    assert_eq!(neighbors[0].neighbor_route_id, C);
    assert!((neighbors[0].cosine_distance - 0.293).abs() < 1e-3);
    assert_eq!(neighbors[1].neighbor_route_id, B);
    assert!((neighbors[1].cosine_distance - 1.0).abs() < 1e-6);
}

#[test]
fn test_similar_by_id_excludes_self_and_bounds_size() {
    let (_dir, store) = toy_store();
    let engine = SimilarityEngine::new(
        store,
        Arc::new(FixedEmbedder::new(vec![1.0, 0.0])),
        SimilarityConfig::default(),
    );

    for k in [0, 1, 2, 5, 100] {
        let neighbors = engine.similar_by_id(B, k).unwrap();
        assert!(neighbors.len() <= k.min(2));
        assert!(neighbors.iter().all(|n| n.neighbor_route_id != B));
    }
    assert_eq!(engine.similar_by_id(B, 100).unwrap().len(), 2);
}

#[test]
fn test_similar_by_id_unknown_route() {
    let (_dir, store) = toy_store();
    store.upsert(RouteId(9), Some("text only"), None).unwrap();
    let engine = SimilarityEngine::new(
        store,
        Arc::new(FixedEmbedder::new(vec![1.0, 0.0])),
        SimilarityConfig::default(),
    );

    match engine.similar_by_id(RouteId(404), 3) {
        Err(VectorError::NotFound(id)) => assert_eq!(id, RouteId(404)),
        other => panic!("expected NotFound, got {:?}", other),
    }
    // Described but never embedded
    assert!(matches!(
        engine.similar_by_id(RouteId(9), 3),
        Err(VectorError::NotFound(_))
    ));
}

#[test]
fn test_similar_by_text_empty_store() {
    let (_dir, store) = counting_store(2);
    let embedder = Arc::new(FixedEmbedder::new(vec![1.0, 0.0]));
    let engine = SimilarityEngine::new(store, embedder.clone(), SimilarityConfig::default());

    let matches = engine.similar_by_text("", 10).unwrap();
    assert!(matches.is_empty());
    assert_eq!(embedder.calls(), 0);
}

#[test]
fn test_similar_by_text_ranks_and_returns_descriptions() {
    let (_dir, store) = toy_store();
    let engine = SimilarityEngine::new(
        store,
        Arc::new(FixedEmbedder::new(vec![0.0, 1.0])),
        SimilarityConfig::default(),
    );

    let matches = engine.similar_by_text("anything", 10).unwrap();
    assert_eq!(matches.len(), 3);
    assert_eq!(matches[0].route_id, B);
    assert_eq!(matches[0].description.as_deref(), Some("route b"));
    assert_eq!(matches[1].route_id, C);
    assert_eq!(matches[2].route_id, A);
    assert!(matches
        .windows(2)
        .all(|w| w[0].cosine_distance <= w[1].cosine_distance));

    assert_eq!(engine.similar_by_text("anything", 1).unwrap().len(), 1);
}

#[test]
fn test_similar_by_text_dimension_mismatch() {
    let (_dir, store) = toy_store();
    let engine = SimilarityEngine::new(
        store,
        Arc::new(FixedEmbedder::new(vec![1.0, 0.0, 0.0])),
        SimilarityConfig::default(),
    );

    let err = engine.similar_by_text("three dims", 5).unwrap_err();
    assert!(matches!(
        err,
        VectorError::DimensionMismatch {
            expected: 2,
            actual: 3
        }
    ));
    assert!(err.is_client_error());
}

#[test]
fn test_end_to_end_ingest_then_query() {
    let (_dir, store) = counting_store(32);
    let embedder = Arc::new(HashEmbedder::new(32));
    IngestPipeline::new(
        Arc::new(SyntheticRoutes(200)),
        store.clone(),
        embedder.clone(),
        IngestConfig {
            chunk_size: 64,
            pause: Duration::ZERO,
            ..Default::default()
        },
    )
    .run(IngestMode::All)
    .unwrap();

    let engine = SimilarityEngine::new(store.clone(), embedder, SimilarityConfig::default());

    let target = store.get(RouteId(17)).unwrap().unwrap();
    let matches = engine
        .similar_by_text(target.description.as_deref().unwrap(), 5)
        .unwrap();
    assert_eq!(matches.len(), 5);
    assert!(matches[0].cosine_distance.abs() < 1e-5);
    assert!(matches
        .windows(2)
        .all(|w| w[0].cosine_distance <= w[1].cosine_distance));

    let neighbors = engine.similar_by_id(RouteId(17), 10).unwrap();
    assert_eq!(neighbors.len(), 10);
    assert!(neighbors.iter().all(|n| n.neighbor_route_id != RouteId(17)));
    assert!(neighbors
        .windows(2)
        .all(|w| w[0].cosine_distance <= w[1].cosine_distance));
}
