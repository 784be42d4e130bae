//! Embedding module for semantic route search
//!
//! Wraps fastembed sentence-transformer models behind the [`Embedder`]
//! trait so the pipeline and query engine never touch the model directly.

mod discovery;
mod engine;
mod fastembed_model;

pub use discovery::find_model_cache_dir;
pub use engine::{dot, l2_norm, normalize, Embedder, QueryCache, VectorEngine};
pub use fastembed_model::{FastEmbedConfig, FastEmbedModel, ModelChoice, DEFAULT_DIMENSION};
