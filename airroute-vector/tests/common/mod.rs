//! Shared fixtures for integration tests

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use airroute_vector::embedding::normalize;
use airroute_vector::error::Result;
use airroute_vector::{
    Embedder, EmbeddingRecord, EmbeddingStore, EmbeddingUpsert, JoinedRoute, RouteId,
    RouteSource, RouteStore, VectorError,
};
use tempfile::TempDir;

/// Deterministic bag-of-bytes embedder that counts its calls
pub struct HashEmbedder {
    dimension: usize,
    calls: AtomicUsize,
    /// Fail on this call number (1-based)
    fail_on: Option<usize>,
}

impl HashEmbedder {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            calls: AtomicUsize::new(0),
            fail_on: None,
        }
    }

    pub fn failing_on(dimension: usize, call: usize) -> Self {
        Self {
            fail_on: Some(call),
            ..Self::new(dimension)
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn vector(&self, text: &str) -> Vec<f32> {
        let mut v = vec![0.0_f32; self.dimension];
        for (i, b) in text.bytes().enumerate() {
            v[(b as usize * 31 + i) % self.dimension] += 1.0;
        }
        normalize(&mut v);
        v
    }
}

impl Embedder for HashEmbedder {
    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail_on == Some(call) {
            return Err(VectorError::embedding("inference backend unavailable"));
        }
        Ok(texts.iter().map(|t| self.vector(t)).collect())
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

/// Embedder that returns the same vector for every text
pub struct FixedEmbedder {
    pub vector: Vec<f32>,
    pub calls: AtomicUsize,
}

impl FixedEmbedder {
    pub fn new(vector: Vec<f32>) -> Self {
        Self {
            vector,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Embedder for FixedEmbedder {
    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(texts.iter().map(|_| self.vector.clone()).collect())
    }

    fn dimension(&self) -> usize {
        self.vector.len()
    }
}

/// Synthetic route network of `count` routes
pub struct SyntheticRoutes(pub usize);

impl RouteSource for SyntheticRoutes {
    fn joined_routes(&self, limit: usize) -> Result<Vec<JoinedRoute>> {
        const CITIES: [(&str, &str, &str); 5] = [
            ("London", "LHR", "United Kingdom"),
            ("Paris", "CDG", "France"),
            ("Tokyo", "HND", "Japan"),
            ("Nairobi", "NBO", "Kenya"),
            ("Lima", "LIM", "Peru"),
        ];
        Ok((1..=self.0.min(limit))
            .map(|i| {
                let src = CITIES[i % CITIES.len()];
                let dst = CITIES[(i / CITIES.len()) % CITIES.len()];
                JoinedRoute {
                    route_id: RouteId(i as u64),
                    stops: Some((i % 2) as u32),
                    equipment: (i % 3 != 0).then(|| format!("{}", 300 + i % 50)),
                    src_city: Some(src.0.into()),
                    src_iata: Some(src.1.into()),
                    src_country: Some(src.2.into()),
                    dst_city: Some(dst.0.into()),
                    dst_iata: Some(dst.1.into()),
                    dst_country: Some(dst.2.into()),
                    airline_name: Some(format!("Carrier {}", i % 7)),
                }
            })
            .collect())
    }
}

/// Store wrapper that counts chunk commits
pub struct CountingStore {
    pub inner: RouteStore,
    chunks: AtomicUsize,
}

impl CountingStore {
    pub fn chunks(&self) -> usize {
        self.chunks.load(Ordering::SeqCst)
    }
}

impl EmbeddingStore for CountingStore {
    fn dimension(&self) -> usize {
        self.inner.dimension()
    }

    fn upsert(
        &self,
        route_id: RouteId,
        description: Option<&str>,
        embedding: Option<&[f32]>,
    ) -> Result<()> {
        self.inner.upsert(route_id, description, embedding)
    }

    fn upsert_chunk(&self, rows: &[EmbeddingUpsert]) -> Result<()> {
        self.chunks.fetch_add(1, Ordering::SeqCst);
        self.inner.upsert_chunk(rows)
    }

    fn get(&self, route_id: RouteId) -> Result<Option<EmbeddingRecord>> {
        self.inner.get(route_id)
    }

    fn read_all(&self) -> Result<Vec<EmbeddingRecord>> {
        self.inner.read_all()
    }

    fn read_described(&self, limit: usize) -> Result<Vec<EmbeddingRecord>> {
        self.inner.read_described(limit)
    }
}

/// Fresh store in a temporary directory
pub fn counting_store(dimension: usize) -> (TempDir, Arc<CountingStore>) {
    let temp_dir = TempDir::new().unwrap();
    let inner = RouteStore::new(temp_dir.path(), dimension).unwrap();
    let store = Arc::new(CountingStore {
        inner,
        chunks: AtomicUsize::new(0),
    });
    (temp_dir, store)
}
