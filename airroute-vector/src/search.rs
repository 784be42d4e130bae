//! Similarity query engine
//!
//! Exact nearest-neighbor search by cosine distance over a full snapshot of
//! the stored embeddings. Stateless: each call reads the store once, ranks
//! and returns.

use serde::Serialize;
use std::cmp::Ordering;
use std::sync::Arc;

use crate::embedding::{dot, Embedder};
use crate::error::{Result, VectorError};
use crate::route::{EmbeddingRecord, RouteId};
use crate::storage::EmbeddingStore;

/// Neighbor of a stored route
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Neighbor {
    pub neighbor_route_id: RouteId,
    pub cosine_distance: f32,
}

/// Route matching a free-text query
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextMatch {
    pub route_id: RouteId,
    pub description: Option<String>,
    pub cosine_distance: f32,
}

/// A scored candidate, index into the snapshot it was ranked from
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ranked {
    pub index: usize,
    pub route_id: RouteId,
    pub distance: f32,
}

/// Rank candidates by `1 - dot(target, candidate)`, ascending
///
/// Ties are broken by ascending route id. `exclude` removes one route (the
/// query itself) from the ranking. Both target and candidates are expected
/// to be unit-norm.
pub fn rank(
    target: &[f32],
    candidates: &[EmbeddingRecord],
    exclude: Option<RouteId>,
    k: usize,
) -> Result<Vec<Ranked>> {
    if k == 0 {
        return Ok(vec![]);
    }

    let mut scored = Vec::with_capacity(candidates.len());
    for (index, record) in candidates.iter().enumerate() {
        if Some(record.route_id) == exclude {
            continue;
        }
        let Some(vector) = record.embedding.as_deref() else {
            continue;
        };
        if vector.len() != target.len() {
            log::error!(
                "Stored embedding for route {} has {} dimensions, expected {}",
                record.route_id,
                vector.len(),
                target.len()
            );
            return Err(VectorError::dimension(target.len(), vector.len()));
        }
        scored.push(Ranked {
            index,
            route_id: record.route_id,
            distance: 1.0 - dot(target, vector),
        });
    }

    scored.sort_by(compare);
    scored.truncate(k);
    Ok(scored)
}

fn compare(a: &Ranked, b: &Ranked) -> Ordering {
    a.distance
        .total_cmp(&b.distance)
        .then_with(|| a.route_id.cmp(&b.route_id))
}

/// Similarity search configuration
#[derive(Debug, Clone)]
pub struct SimilarityConfig {
    /// Results returned when the caller does not say (default: 10)
    pub default_top_k: usize,
    /// Upper bound on requested results (default: 100)
    pub max_top_k: usize,
}

impl Default for SimilarityConfig {
    fn default() -> Self {
        Self {
            default_top_k: 10,
            max_top_k: 100,
        }
    }
}

impl SimilarityConfig {
    /// Resolve a requested top-k against the defaults and ceiling
    pub fn top_k(&self, requested: Option<usize>) -> usize {
        requested
            .unwrap_or(self.default_top_k)
            .min(self.max_top_k)
    }
}

/// Similarity query engine over an embedding store
pub struct SimilarityEngine<S: ?Sized, E: ?Sized> {
    store: Arc<S>,
    embedder: Arc<E>,
    config: SimilarityConfig,
}

impl<S, E> SimilarityEngine<S, E>
where
    S: EmbeddingStore + ?Sized,
    E: Embedder + ?Sized,
{
    /// Create new query engine
    pub fn new(store: Arc<S>, embedder: Arc<E>, config: SimilarityConfig) -> Self {
        Self {
            store,
            embedder,
            config,
        }
    }

    /// Get configuration
    pub fn config(&self) -> &SimilarityConfig {
        &self.config
    }

    /// The `k` stored routes closest to `route_id`, excluding itself
    pub fn similar_by_id(&self, route_id: RouteId, k: usize) -> Result<Vec<Neighbor>> {
        let snapshot = self.store.read_all()?;
        let target = snapshot
            .iter()
            .find(|r| r.route_id == route_id)
            .and_then(|r| r.embedding.as_deref())
            .ok_or(VectorError::NotFound(route_id))?;

        let expected = self.store.dimension();
        if target.len() != expected {
            return Err(VectorError::dimension(expected, target.len()));
        }

        let ranked = rank(target, &snapshot, Some(route_id), k)?;
        log::debug!(
            "similar_by_id({}) ranked {} candidates, returning {}",
            route_id,
            snapshot.len().saturating_sub(1),
            ranked.len()
        );

        Ok(ranked
            .into_iter()
            .map(|r| Neighbor {
                neighbor_route_id: r.route_id,
                cosine_distance: r.distance,
            })
            .collect())
    }

    /// The `k` stored routes closest to a free-text query
    pub fn similar_by_text(&self, query: &str, k: usize) -> Result<Vec<TextMatch>> {
        let snapshot = self.store.read_all()?;
        if snapshot.is_empty() || k == 0 {
            return Ok(vec![]);
        }

        let query_vector = self.embedder.embed(query)?;
        let expected = self.store.dimension();
        if query_vector.len() != expected {
            return Err(VectorError::dimension(expected, query_vector.len()));
        }

        let ranked = rank(&query_vector, &snapshot, None, k)?;
        log::debug!(
            "similar_by_text ranked {} candidates, returning {}",
            snapshot.len(),
            ranked.len()
        );

        Ok(ranked
            .into_iter()
            .map(|r| TextMatch {
                route_id: r.route_id,
                description: snapshot[r.index].description.clone(),
                cosine_distance: r.distance,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: u64, v: &[f32]) -> EmbeddingRecord {
        EmbeddingRecord {
            route_id: RouteId(id),
            description: None,
            embedding: Some(v.to_vec()),
        }
    }

    #[test]
    fn test_rank_orders_by_distance() {
        let candidates = vec![
            record(1, &[0.0, 1.0]),
            record(2, &[1.0, 0.0]),
            record(3, &[0.6, 0.8]),
        ];
        let ranked = rank(&[1.0, 0.0], &candidates, None, 10).unwrap();
        let ids: Vec<u64> = ranked.iter().map(|r| r.route_id.0).collect();
        assert_eq!(ids, vec![2, 3, 1]);
        assert!(ranked[0].distance.abs() < 1e-6);
        assert!((ranked[1].distance - 0.4).abs() < 1e-6);
        assert!((ranked[2].distance - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_rank_ties_break_by_route_id() {
        let candidates = vec![
            record(9, &[0.0, 1.0]),
            record(4, &[0.0, 1.0]),
            record(6, &[0.0, 1.0]),
        ];
        let ranked = rank(&[1.0, 0.0], &candidates, None, 3).unwrap();
        let ids: Vec<u64> = ranked.iter().map(|r| r.route_id.0).collect();
        assert_eq!(ids, vec![4, 6, 9]);
    }

    #[test]
    fn test_rank_excludes_and_truncates() {
        let candidates = vec![
            record(1, &[1.0, 0.0]),
            record(2, &[1.0, 0.0]),
            record(3, &[0.0, 1.0]),
        ];
        let ranked = rank(&[1.0, 0.0], &candidates, Some(RouteId(1)), 1).unwrap();
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].route_id, RouteId(2));
        assert_eq!(ranked[0].index, 1);
    }

    #[test]
    fn test_rank_zero_k() {
        let candidates = vec![record(1, &[1.0, 0.0])];
        assert!(rank(&[1.0, 0.0], &candidates, None, 0).unwrap().is_empty());
    }

    #[test]
    fn test_rank_rejects_stored_dimension_mismatch() {
        let candidates = vec![record(1, &[1.0, 0.0, 0.0])];
        let err = rank(&[1.0, 0.0], &candidates, None, 5).unwrap_err();
        assert!(matches!(
            err,
            VectorError::DimensionMismatch {
                expected: 2,
                actual: 3
            }
        ));
    }

    #[test]
    fn test_config_top_k() {
        let config = SimilarityConfig::default();
        assert_eq!(config.top_k(None), 10);
        assert_eq!(config.top_k(Some(3)), 3);
        assert_eq!(config.top_k(Some(10_000)), 100);
    }
}
