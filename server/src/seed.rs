//! Batch seeding: load OpenFlights files, describe and embed routes.

use std::path::Path;
use std::sync::Arc;

use airroute_vector::ingest::describe_routes;
use airroute_vector::{
    EmbeddingStore, IngestMode, IngestPipeline, IngestReport, OpenFlights, RouteMetrics,
    RouteStore, VectorEngine, VectorError,
};
use anyhow::Context;
use serde::Serialize;

use crate::config::{SeedArgs, SeedMode, Settings};

/// Rows written by a `load` step
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LoadReport {
    pub airports: usize,
    pub airlines: usize,
    pub routes: usize,
    pub passenger_stats: usize,
    pub delay_risks: usize,
    pub skipped: usize,
}

/// What a seed run did
#[derive(Debug, Clone, Default, Serialize)]
pub struct SeedOutcome {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub load: Option<LoadReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ingest: Option<IngestReport>,
}

/// Parse the OpenFlights files in `dir`, plus any route metrics files next
/// to them, and write them to the store
pub fn load_data(store: &RouteStore, dir: &Path) -> anyhow::Result<LoadReport> {
    let data = OpenFlights::load_dir(dir)
        .with_context(|| format!("Failed to read OpenFlights data from {}", dir.display()))?;
    let metrics = RouteMetrics::load_dir(dir)
        .with_context(|| format!("Failed to read route metrics from {}", dir.display()))?;

    let report = LoadReport {
        airports: store.put_airports(&data.airports.rows)?,
        airlines: store.put_airlines(&data.airlines.rows)?,
        routes: store.put_routes(&data.routes.rows)?,
        passenger_stats: store.put_passenger_stats(&metrics.passenger_stats.rows)?,
        delay_risks: store.put_delay_risks(&metrics.delay_risks.rows)?,
        skipped: data.airports.skipped
            + data.airlines.skipped
            + data.routes.skipped
            + metrics.passenger_stats.skipped
            + metrics.delay_risks.skipped,
    };
    tracing::info!(
        "Loaded {} airports, {} airlines, {} routes, {} passenger stats, {} delay risks",
        report.airports,
        report.airlines,
        report.routes,
        report.passenger_stats,
        report.delay_risks
    );
    Ok(report)
}

/// Load the embedding model and check it against the store dimension
pub fn load_engine(settings: &Settings, store: &RouteStore) -> anyhow::Result<Arc<VectorEngine>> {
    tracing::info!("Loading embedding model {}", settings.model);
    let engine = VectorEngine::new(settings.models_path.as_deref(), settings.embedding_config())
        .context("Failed to load embedding model")?;

    let expected = store.dimension();
    if engine.dimension() != expected {
        return Err(VectorError::dimension(expected, engine.dimension()).into());
    }
    Ok(Arc::new(engine))
}

/// Run one seed invocation against an open store
pub fn run(settings: &Settings, args: &SeedArgs, store: Arc<RouteStore>) -> anyhow::Result<SeedOutcome> {
    let config = args.ingest_config();
    let mut outcome = SeedOutcome::default();

    match args.mode {
        SeedMode::Load => {
            outcome.load = Some(load_data(&store, &args.data_dir)?);
        }
        SeedMode::Describe => {
            outcome.ingest = Some(describe_routes(store.as_ref(), store.as_ref(), &config)?);
        }
        SeedMode::Embed => {
            let engine = load_engine(settings, &store)?;
            let pipeline = IngestPipeline::new(store.clone(), store, engine, config);
            outcome.ingest = Some(pipeline.run(IngestMode::Embed)?);
        }
        SeedMode::All => {
            if OpenFlights::present_in(&args.data_dir) {
                outcome.load = Some(load_data(&store, &args.data_dir)?);
            } else {
                tracing::warn!(
                    "No OpenFlights files in {}, using routes already in the store",
                    args.data_dir.display()
                );
            }
            let engine = load_engine(settings, &store)?;
            let pipeline = IngestPipeline::new(store.clone(), store, engine, config);
            outcome.ingest = Some(pipeline.run(IngestMode::All)?);
        }
    }

    if let Some(report) = &outcome.ingest {
        tracing::info!(
            "Seed {} finished: {} selected, {} written in {} chunks, {} skipped",
            report.mode,
            report.selected,
            report.written,
            report.chunks,
            report.skipped
        );
    }
    Ok(outcome)
}
