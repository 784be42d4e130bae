//! Batch ingestion pipeline
//!
//! Synthesizer → embedding service → store, chunk by chunk. Every run
//! processes the whole selected set; upserts are keyed by route id, so a run
//! that died halfway can simply be started again.

use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

use crate::describe::synthesize;
use crate::embedding::Embedder;
use crate::error::{Result, VectorError};
use crate::route::RouteId;
use crate::storage::{EmbeddingStore, EmbeddingUpsert, RouteSource};

/// Which part of the pipeline to run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum IngestMode {
    /// Write descriptions only
    Describe,
    /// Embed already-stored descriptions
    Embed,
    /// Describe and embed in one pass
    All,
}

impl std::str::FromStr for IngestMode {
    type Err = VectorError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "describe" => Ok(Self::Describe),
            "embed" => Ok(Self::Embed),
            "all" => Ok(Self::All),
            other => Err(VectorError::other(format!("Unknown ingest mode: {}", other))),
        }
    }
}

impl std::fmt::Display for IngestMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Describe => "describe",
            Self::Embed => "embed",
            Self::All => "all",
        })
    }
}

/// Ingestion configuration
#[derive(Debug, Clone)]
pub struct IngestConfig {
    /// Maximum routes selected per run (default: 50000)
    pub limit: usize,
    /// Routes per embedding call and store chunk (default: 500)
    pub chunk_size: usize,
    /// Fixed pause between chunks (default: 300ms)
    pub pause: Duration,
    /// Skip routes that are already embedded: in `All` mode only when the
    /// stored description also matches, in `Embed` mode whenever one exists
    pub skip_unchanged: bool,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            limit: 50_000,
            chunk_size: 500,
            pause: Duration::from_millis(300),
            skip_unchanged: false,
        }
    }
}

/// Outcome of one pipeline run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    pub mode: IngestMode,
    /// Routes selected for this run
    pub selected: usize,
    /// Chunks committed
    pub chunks: usize,
    /// Records written
    pub written: usize,
    /// Routes skipped as unchanged
    pub skipped: usize,
}

impl IngestReport {
    fn new(mode: IngestMode) -> Self {
        Self {
            mode,
            selected: 0,
            chunks: 0,
            written: 0,
            skipped: 0,
        }
    }
}

/// Chunked describe/embed/upsert pipeline
pub struct IngestPipeline<R: ?Sized, S: ?Sized, E: ?Sized> {
    source: Arc<R>,
    store: Arc<S>,
    embedder: Arc<E>,
    config: IngestConfig,
}

impl<R, S, E> IngestPipeline<R, S, E>
where
    R: RouteSource + ?Sized,
    S: EmbeddingStore + ?Sized,
    E: Embedder + ?Sized,
{
    /// Create a pipeline; `chunk_size` is clamped to at least 1
    pub fn new(source: Arc<R>, store: Arc<S>, embedder: Arc<E>, mut config: IngestConfig) -> Self {
        config.chunk_size = config.chunk_size.max(1);
        Self {
            source,
            store,
            embedder,
            config,
        }
    }

    /// Get configuration
    pub fn config(&self) -> &IngestConfig {
        &self.config
    }

    /// Run the pipeline. The first failing chunk aborts the run; chunks
    /// committed before it stay committed.
    pub fn run(&self, mode: IngestMode) -> Result<IngestReport> {
        log::info!(
            "Ingestion started (mode: {}, limit: {}, chunk: {})",
            mode,
            self.config.limit,
            self.config.chunk_size
        );

        let report = match mode {
            IngestMode::Describe => self.run_describe()?,
            IngestMode::Embed => self.run_embed()?,
            IngestMode::All => self.run_all()?,
        };

        log::info!(
            "Ingestion finished: {} selected, {} written in {} chunks, {} skipped",
            report.selected,
            report.written,
            report.chunks,
            report.skipped
        );
        Ok(report)
    }

    fn run_describe(&self) -> Result<IngestReport> {
        describe_routes(self.source.as_ref(), self.store.as_ref(), &self.config)
    }

    fn run_embed(&self) -> Result<IngestReport> {
        let records = self.store.read_described(self.config.limit)?;
        let mut report = IngestReport::new(IngestMode::Embed);
        report.selected = records.len();

        let pending: Vec<(RouteId, String)> = records
            .into_iter()
            .filter(|r| !(self.config.skip_unchanged && r.embedding.is_some()))
            .filter_map(|r| r.description.map(|d| (r.route_id, d)))
            .collect();
        report.skipped = report.selected - pending.len();

        let (chunks, written) = for_each_chunk(&pending, &self.config, |chunk| {
            let vectors = self.embed_chunk(chunk)?;
            let rows: Vec<EmbeddingUpsert> = chunk
                .iter()
                .zip(vectors)
                .map(|((route_id, _), vector)| EmbeddingUpsert {
                    route_id: *route_id,
                    description: None,
                    embedding: Some(vector),
                })
                .collect();
            self.store.upsert_chunk(&rows)?;
            Ok(rows.len())
        })?;
        report.chunks = chunks;
        report.written = written;

        Ok(report)
    }

    fn run_all(&self) -> Result<IngestReport> {
        let described = synthesize(self.source.as_ref(), self.config.limit)?;
        let mut report = IngestReport::new(IngestMode::All);
        report.selected = described.len();

        let pending = if self.config.skip_unchanged {
            let pending = self.changed_only(described)?;
            report.skipped = report.selected - pending.len();
            pending
        } else {
            described
        };

        let (chunks, written) = for_each_chunk(&pending, &self.config, |chunk| {
            let vectors = self.embed_chunk(chunk)?;
            let rows: Vec<EmbeddingUpsert> = chunk
                .iter()
                .zip(vectors)
                .map(|((route_id, description), vector)| EmbeddingUpsert {
                    route_id: *route_id,
                    description: Some(description.clone()),
                    embedding: Some(vector),
                })
                .collect();
            self.store.upsert_chunk(&rows)?;
            Ok(rows.len())
        })?;
        report.chunks = chunks;
        report.written = written;

        Ok(report)
    }

    /// Drop routes whose stored description matches and is already embedded
    fn changed_only(&self, described: Vec<(RouteId, String)>) -> Result<Vec<(RouteId, String)>> {
        let mut pending = Vec::with_capacity(described.len());
        for (route_id, description) in described {
            let unchanged = match self.store.get(route_id)? {
                Some(record) => {
                    record.embedding.is_some()
                        && record.description.as_deref() == Some(description.as_str())
                }
                None => false,
            };
            if !unchanged {
                pending.push((route_id, description));
            }
        }
        Ok(pending)
    }

    /// One embedding call per chunk, validated before anything is written
    fn embed_chunk(&self, chunk: &[(RouteId, String)]) -> Result<Vec<Vec<f32>>> {
        let texts: Vec<&str> = chunk.iter().map(|(_, d)| d.as_str()).collect();
        let vectors = self.embedder.embed_batch(&texts)?;

        if vectors.len() != chunk.len() {
            return Err(VectorError::embedding(format!(
                "Embedder returned {} vectors for {} texts",
                vectors.len(),
                chunk.len()
            )));
        }
        let expected = self.store.dimension();
        if let Some(bad) = vectors.iter().find(|v| v.len() != expected) {
            return Err(VectorError::dimension(expected, bad.len()));
        }
        Ok(vectors)
    }
}

/// Write descriptions for up to `config.limit` routes without embedding them
pub fn describe_routes<R, S>(source: &R, store: &S, config: &IngestConfig) -> Result<IngestReport>
where
    R: RouteSource + ?Sized,
    S: EmbeddingStore + ?Sized,
{
    let described = synthesize(source, config.limit)?;
    let mut report = IngestReport::new(IngestMode::Describe);
    report.selected = described.len();

    let (chunks, written) = for_each_chunk(&described, config, |chunk| {
        let rows: Vec<EmbeddingUpsert> = chunk
            .iter()
            .map(|(route_id, description)| EmbeddingUpsert {
                route_id: *route_id,
                description: Some(description.clone()),
                embedding: None,
            })
            .collect();
        store.upsert_chunk(&rows)?;
        Ok(rows.len())
    })?;
    report.chunks = chunks;
    report.written = written;

    Ok(report)
}

/// Run `process` over fixed-size chunks, pausing between them
///
/// Returns (chunks committed, records written).
fn for_each_chunk(
    items: &[(RouteId, String)],
    config: &IngestConfig,
    mut process: impl FnMut(&[(RouteId, String)]) -> Result<usize>,
) -> Result<(usize, usize)> {
    let chunk_size = config.chunk_size.max(1);
    let total = items.len();
    let chunk_count = total.div_ceil(chunk_size);
    let mut written = 0;

    for (index, chunk) in items.chunks(chunk_size).enumerate() {
        let start = index * chunk_size;
        log::info!(
            "Processing routes {}-{} of {}",
            start,
            start + chunk.len(),
            total
        );

        written += process(chunk)?;

        if index + 1 < chunk_count && !config.pause.is_zero() {
            std::thread::sleep(config.pause);
        }
    }
    Ok((chunk_count, written))
}
