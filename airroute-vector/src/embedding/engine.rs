//! Vector embedding engine
//!
//! High-level API for turning route descriptions and search text into
//! unit-norm vectors.

use super::discovery::find_model_cache_dir;
use super::fastembed_model::{FastEmbedConfig, FastEmbedModel};
use crate::error::{Result, VectorError};
use lru::LruCache;
use parking_lot::Mutex;
use std::num::NonZeroUsize;
use std::path::Path;
use std::sync::Arc;

/// Text-to-vector capability used by the ingestion pipeline and the query engine
///
/// Implementations must return exactly one vector per input text, in input
/// order, each L2-normalized. Failures are returned as-is; callers decide
/// whether to retry.
pub trait Embedder: Send + Sync {
    /// Embed a batch of texts
    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>>;

    /// Embed a single text
    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.embed_batch(&[text])?
            .pop()
            .ok_or_else(|| VectorError::embedding("Embedder returned no vector"))
    }

    /// Output dimension
    fn dimension(&self) -> usize;
}

impl<E: Embedder + ?Sized> Embedder for Arc<E> {
    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        (**self).embed_batch(texts)
    }

    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        (**self).embed(text)
    }

    fn dimension(&self) -> usize {
        (**self).dimension()
    }
}

/// Bounded LRU memo of query embeddings, keyed by the raw query text
pub struct QueryCache {
    entries: Option<Mutex<LruCache<String, Vec<f32>>>>,
}

impl QueryCache {
    /// Create a cache holding at most `capacity` entries; 0 disables it
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: NonZeroUsize::new(capacity).map(|c| Mutex::new(LruCache::new(c))),
        }
    }

    pub fn get(&self, text: &str) -> Option<Vec<f32>> {
        self.entries.as_ref()?.lock().get(text).cloned()
    }

    /// Insert, evicting the least recently used entry when full
    pub fn insert(&self, text: &str, embedding: Vec<f32>) {
        if let Some(entries) = &self.entries {
            entries.lock().put(text.to_string(), embedding);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.as_ref().map_or(0, |e| e.lock().len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Vector embedding engine with a query cache
///
/// Constructed once per process and shared by reference. Single-text
/// embeddings (search queries) are memoized in a bounded LRU; batch calls
/// from ingestion are not, since every description is embedded once per run.
pub struct VectorEngine {
    model: Arc<FastEmbedModel>,
    cache: QueryCache,
    dimension: usize,
}

impl VectorEngine {
    /// Create VectorEngine, downloading the model on first use
    ///
    /// # Arguments
    /// * `cache_dir` - Optional model cache override
    /// * `config` - Model selection and inference settings
    pub fn new(cache_dir: Option<&Path>, config: FastEmbedConfig) -> Result<Self> {
        let cache_dir = find_model_cache_dir(cache_dir)?;
        let cache = QueryCache::new(config.query_cache_capacity);
        let model = FastEmbedModel::load(&cache_dir, config)?;
        let dimension = model.dimension();

        log::info!("VectorEngine ready ({}d)", dimension);

        Ok(Self {
            model: Arc::new(model),
            cache,
            dimension,
        })
    }
}

impl Embedder for VectorEngine {
    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        let mut vectors = self.model.embed_batch(texts)?;
        if vectors.len() != texts.len() {
            return Err(VectorError::embedding(format!(
                "Model returned {} vectors for {} texts",
                vectors.len(),
                texts.len()
            )));
        }
        vectors.iter_mut().for_each(|v| normalize(v));
        Ok(vectors)
    }

    /// Generate embedding with caching
    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        if let Some(cached) = self.cache.get(text) {
            return Ok(cached);
        }

        let embedding = self
            .embed_batch(&[text])?
            .pop()
            .ok_or_else(|| VectorError::embedding("Model returned no vector"))?;
        self.cache.insert(text, embedding.clone());
        Ok(embedding)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

/// Dot product; cosine similarity for unit-norm inputs
pub fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

/// Euclidean norm
pub fn l2_norm(v: &[f32]) -> f32 {
    v.iter().map(|x| x * x).sum::<f32>().sqrt()
}

/// Scale to unit length in place. Zero vectors are left unchanged.
pub fn normalize(v: &mut [f32]) {
    let norm = l2_norm(v);
    if norm > 0.0 {
        v.iter_mut().for_each(|x| *x /= norm);
    }
}
