//! AirRoute Server Entry Point
//!
//! Subcommands:
//! - `seed`: load OpenFlights data, describe and embed routes
//! - `serve`: HTTP API for similarity search and network analytics
//! - `stats`: print store statistics
//! - `export`: write analytics reports as CSV

use std::process::ExitCode;
use std::sync::Arc;

use airroute_server::api::{self, AppState};
use airroute_server::config::{Cli, Command};
use airroute_server::{export, seed};
use airroute_vector::{Embedder, RouteStore, SimilarityEngine};
use anyhow::Context;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "airroute_server=info,airroute_vector=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let settings = cli.settings;
    let store = Arc::new(
        RouteStore::new(&settings.db_path, settings.dimension)
            .with_context(|| format!("Failed to open store at {}", settings.db_path.display()))?,
    );

    match cli.command {
        Command::Seed(args) => {
            tracing::info!("Seeding (mode: {:?})", args.mode);
            let outcome =
                tokio::task::spawn_blocking(move || seed::run(&settings, &args, store)).await??;
            println!("{}", serde_json::to_string_pretty(&outcome)?);
        }
        Command::Serve(args) => {
            let engine = {
                let settings = settings.clone();
                let store = store.clone();
                tokio::task::spawn_blocking(move || seed::load_engine(&settings, &store)).await??
            };
            let embedder: Arc<dyn Embedder> = engine;
            let search = SimilarityEngine::new(store.clone(), embedder, args.similarity_config());
            api::serve(AppState::new(store, search), args.bind).await?;
        }
        Command::Stats => {
            let stats = tokio::task::spawn_blocking(move || store.stats()).await??;
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
        Command::Export(args) => {
            let report =
                tokio::task::spawn_blocking(move || export::run(&store, &args.out)).await??;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }
    Ok(())
}
