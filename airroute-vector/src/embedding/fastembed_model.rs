//! fastembed sentence-transformer wrapper
//!
//! ONNX inference of small sentence-transformer models. Output vectors are
//! mean-pooled and L2-normalized.

use crate::error::{Result, VectorError};
use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use std::path::Path;

/// Dimension of the default model (all-MiniLM-L6-v2)
pub const DEFAULT_DIMENSION: usize = 384;

/// Supported embedding models
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ModelChoice {
    /// sentence-transformers/all-MiniLM-L6-v2 (384d)
    #[default]
    AllMiniLmL6V2,
    /// BAAI/bge-small-en-v1.5 (384d)
    BgeSmallEnV15,
}

impl ModelChoice {
    fn fastembed_model(self) -> EmbeddingModel {
        match self {
            Self::AllMiniLmL6V2 => EmbeddingModel::AllMiniLML6V2,
            Self::BgeSmallEnV15 => EmbeddingModel::BGESmallENV15,
        }
    }

    /// Canonical model name
    pub fn name(self) -> &'static str {
        match self {
            Self::AllMiniLmL6V2 => "sentence-transformers/all-MiniLM-L6-v2",
            Self::BgeSmallEnV15 => "BAAI/bge-small-en-v1.5",
        }
    }
}

impl std::str::FromStr for ModelChoice {
    type Err = VectorError;

    fn from_str(s: &str) -> Result<Self> {
        let name = s.trim().to_ascii_lowercase();
        let name = name.rsplit('/').next().unwrap_or_default();
        match name {
            "all-minilm-l6-v2" => Ok(Self::AllMiniLmL6V2),
            "bge-small-en-v1.5" => Ok(Self::BgeSmallEnV15),
            _ => Err(VectorError::model(format!("Unsupported embedding model: {}", s))),
        }
    }
}

impl std::fmt::Display for ModelChoice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// fastembed configuration
#[derive(Debug, Clone)]
pub struct FastEmbedConfig {
    /// Model to load (default: all-MiniLM-L6-v2)
    pub model: ModelChoice,
    /// Maximum sequence length in tokens (default: 256)
    pub max_length: usize,
    /// Inference batch size inside a single call (default: 256)
    pub batch_size: usize,
    /// Print download progress when fetching weights (default: false)
    pub show_download_progress: bool,
    /// Query embeddings kept in the LRU memo, 0 disables it (default: 1024)
    pub query_cache_capacity: usize,
}

impl Default for FastEmbedConfig {
    fn default() -> Self {
        Self {
            model: ModelChoice::default(),
            max_length: 256,
            batch_size: 256,
            show_download_progress: false,
            query_cache_capacity: 1024,
        }
    }
}

/// fastembed text embedding model wrapper
pub struct FastEmbedModel {
    model: TextEmbedding,
    config: FastEmbedConfig,
    dimension: usize,
}

impl FastEmbedModel {
    /// Load the configured model, downloading it into `cache_dir` if needed
    pub fn load(cache_dir: &Path, config: FastEmbedConfig) -> Result<Self> {
        log::info!(
            "Loading embedding model {} (cache: {})",
            config.model,
            cache_dir.display()
        );

        let options = InitOptions::new(config.model.fastembed_model())
            .with_cache_dir(cache_dir.to_path_buf())
            .with_max_length(config.max_length)
            .with_show_download_progress(config.show_download_progress);

        let model = TextEmbedding::try_new(options)
            .map_err(|e| VectorError::model(format!("Failed to load {}: {}", config.model, e)))?;

        // Get dimension by encoding test string
        let test_embed = model
            .embed(vec!["test"], None)
            .map_err(|e| VectorError::model(format!("Failed to encode test string: {}", e)))?;
        let dimension = test_embed
            .first()
            .map(Vec::len)
            .ok_or_else(|| VectorError::model("Model returned no vector for test string"))?;

        log::info!(
            "Loaded {} ({}d, max {} tokens)",
            config.model,
            dimension,
            config.max_length
        );

        Ok(Self {
            model,
            config,
            dimension,
        })
    }

    /// Batch embed multiple texts
    pub fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(vec![]);
        }

        self.model
            .embed(texts.to_vec(), Some(self.config.batch_size))
            .map_err(|e| VectorError::embedding(format!("Failed to encode texts: {}", e)))
    }

    /// Get embedding dimension
    pub fn dimension(&self) -> usize {
        self.dimension
    }
}
