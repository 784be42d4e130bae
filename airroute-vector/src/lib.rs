//! AirRoute Vector
//!
//! Semantic route similarity for the AirRouteIQ flight network dataset:
//! synthesized route descriptions, sentence embeddings persisted in RocksDB,
//! and exact cosine nearest-neighbor queries by route id or free text.
//!
//! ## Features
//!
//! - **Description synthesis** - Deterministic text per route from joined airport/airline rows
//! - **Embeddings** - fastembed all-MiniLM-L6-v2 (384d), unit-norm output
//! - **Chunked ingestion** - Rate-limited, idempotent, restartable batch pipeline
//! - **Similarity search** - Full-scan cosine ranking with deterministic tie-breaks
//! - **OpenFlights loaders** - airports.dat / airlines.dat / routes.dat, plus route metrics
//! - **Network analytics** - Hubs, city pairs, passenger load, delay risk, closure impact
//!
//! ## Example
//!
//! ```ignore
//! use airroute_vector::{
//!     IngestConfig, IngestMode, IngestPipeline, RouteStore, SimilarityConfig,
//!     SimilarityEngine, VectorEngine,
//! };
//!
//! let engine = Arc::new(VectorEngine::new(None, Default::default())?);
//! let store = Arc::new(RouteStore::new(&db_path, engine.dimension())?);
//!
//! IngestPipeline::new(store.clone(), store.clone(), engine.clone(), IngestConfig::default())
//!     .run(IngestMode::All)?;
//!
//! let search = SimilarityEngine::new(store, engine, SimilarityConfig::default());
//! let neighbors = search.similar_by_text("long-haul flight to Tokyo", 5)?;
//! ```

pub mod analytics;
pub mod describe;
pub mod embedding;
pub mod error;
pub mod ingest;
pub mod loader;
pub mod route;
pub mod schema;
pub mod search;
pub mod storage;

// Re-exports for convenience
pub use embedding::{
    Embedder, FastEmbedConfig, ModelChoice, QueryCache, VectorEngine, DEFAULT_DIMENSION,
};
pub use error::VectorError;
pub use ingest::{IngestConfig, IngestMode, IngestPipeline, IngestReport};
pub use loader::{OpenFlights, RouteMetrics};
pub use route::{
    Airline, AirlineId, Airport, AirportId, DelayRisk, EmbeddingRecord, JoinedRoute,
    PassengerStat, Route, RouteId,
};
pub use search::{Neighbor, SimilarityConfig, SimilarityEngine, TextMatch};
pub use storage::{EmbeddingStore, EmbeddingUpsert, RouteSource, RouteStore};
