//! Command-line and environment configuration.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use airroute_vector::{FastEmbedConfig, IngestConfig, ModelChoice, SimilarityConfig};
use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(name = "airroute")]
#[command(about = "AirRouteIQ route similarity: batch ingestion and HTTP API")]
#[command(version)]
pub struct Cli {
    #[command(flatten)]
    pub settings: Settings,

    #[command(subcommand)]
    pub command: Command,
}

/// Settings shared by every subcommand
#[derive(Args, Debug, Clone)]
pub struct Settings {
    /// RocksDB directory holding routes and embeddings
    #[arg(long, env = "AIRROUTE_DB_PATH", default_value = "data/airroute.db", global = true)]
    pub db_path: PathBuf,

    /// Sentence embedding model
    #[arg(
        long,
        env = "EMBEDDING_MODEL_NAME",
        default_value = "sentence-transformers/all-MiniLM-L6-v2",
        global = true
    )]
    pub model: ModelChoice,

    /// Embedding dimension the store is created with
    #[arg(long, env = "EMBEDDING_DIMENSIONS", default_value_t = 384, global = true)]
    pub dimension: usize,

    /// Directory for downloaded model weights
    #[arg(long, env = "AIRROUTE_MODELS_PATH", global = true)]
    pub models_path: Option<PathBuf>,

    /// Query embeddings memoized in memory (0 disables the memo)
    #[arg(long, env = "AIRROUTE_QUERY_CACHE", default_value_t = 1024, global = true)]
    pub query_cache_size: usize,
}

impl Settings {
    pub fn embedding_config(&self) -> FastEmbedConfig {
        FastEmbedConfig {
            model: self.model,
            query_cache_capacity: self.query_cache_size,
            ..Default::default()
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Load OpenFlights data and generate descriptions/embeddings
    Seed(SeedArgs),
    /// Serve the HTTP API
    Serve(ServeArgs),
    /// Print store statistics as JSON
    Stats,
    /// Write the network analytics reports as CSV files
    Export(ExportArgs),
}

/// Batch step selector
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedMode {
    /// Parse OpenFlights .dat files into the store
    Load,
    /// Generate route descriptions
    Describe,
    /// Embed stored descriptions
    Embed,
    /// Load (when files are present), describe and embed
    All,
}

#[derive(Args, Debug, Clone)]
pub struct SeedArgs {
    /// Which step to run
    #[arg(long, value_enum, default_value_t = SeedMode::All)]
    pub mode: SeedMode,

    /// Directory containing airports.dat, airlines.dat and routes.dat
    #[arg(long, env = "AIRROUTE_DATA_DIR", default_value = "data/raw")]
    pub data_dir: PathBuf,

    /// Maximum routes processed per run
    #[arg(long, default_value_t = 50_000)]
    pub limit: usize,

    /// Routes per embedding call
    #[arg(long, default_value_t = 500)]
    pub chunk_size: usize,

    /// Pause between chunks in milliseconds
    #[arg(long, default_value_t = 300)]
    pub pause_ms: u64,

    /// Skip routes that already have an embedding (for `all`, also an unchanged description)
    #[arg(long)]
    pub skip_unchanged: bool,
}

impl SeedArgs {
    pub fn ingest_config(&self) -> IngestConfig {
        IngestConfig {
            limit: self.limit,
            chunk_size: self.chunk_size.max(1),
            pause: Duration::from_millis(self.pause_ms),
            skip_unchanged: self.skip_unchanged,
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct ServeArgs {
    /// Address to bind the HTTP server to (host:port)
    #[arg(long, env = "AIRROUTE_BIND", default_value = "127.0.0.1:8000")]
    pub bind: SocketAddr,

    /// Results returned when the client does not pass top_k
    #[arg(long, default_value_t = 10)]
    pub default_top_k: usize,

    /// Maximum top_k allowed per request
    #[arg(long, default_value_t = 100)]
    pub max_top_k: usize,
}

impl ServeArgs {
    pub fn similarity_config(&self) -> SimilarityConfig {
        SimilarityConfig {
            default_top_k: self.default_top_k,
            max_top_k: self.max_top_k.max(1),
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct ExportArgs {
    /// Output directory
    #[arg(long, default_value = "exports")]
    pub out: PathBuf,
}
