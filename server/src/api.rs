//! HTTP API over the route store and similarity engine.
//!
//! Every handler does its RocksDB reads and model inference on the blocking
//! pool; the async side only parses queries and serializes results.

use std::net::SocketAddr;
use std::sync::Arc;

use airroute_vector::analytics::{
    self, AffectedRoute, CityPair, Hub, HubLoad, RouteFrequency, RouteRisk,
};
use airroute_vector::{
    AirportId, Embedder, Neighbor, RouteId, RouteStore, SimilarityEngine, TextMatch,
};
use anyhow::Context;
use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;

use crate::error::ApiResult;

/// Similarity engine shared by all requests
pub type RouteSearch = SimilarityEngine<RouteStore, dyn Embedder>;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<RouteStore>,
    pub search: Arc<RouteSearch>,
}

impl AppState {
    pub fn new(store: Arc<RouteStore>, search: RouteSearch) -> Self {
        Self {
            store,
            search: Arc::new(search),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ByRouteParams {
    pub route_id: RouteId,
    #[serde(default)]
    pub top_k: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct ByTextParams {
    #[serde(default)]
    pub q: String,
    #[serde(default)]
    pub top_k: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct LimitParams {
    #[serde(default = "default_limit")]
    pub limit: usize,
}

#[derive(Debug, Deserialize)]
pub struct WideLimitParams {
    #[serde(default = "default_wide_limit")]
    pub limit: usize,
}

#[derive(Debug, Deserialize)]
pub struct RiskLimitParams {
    #[serde(default = "default_risk_limit")]
    pub limit: usize,
}

#[derive(Debug, Deserialize)]
pub struct ClosureParams {
    pub airport_id: AirportId,
}

#[derive(Debug, Deserialize)]
pub struct AlternatesParams {
    pub airport_id: AirportId,
    #[serde(default = "default_alternates")]
    pub top_k: usize,
}

fn default_limit() -> usize {
    20
}

fn default_wide_limit() -> usize {
    50
}

fn default_risk_limit() -> usize {
    100
}

fn default_alternates() -> usize {
    10
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/similar/by-route", get(similar_by_route))
        .route("/similar/by-text", get(similar_by_text))
        .route("/hubs/busiest", get(busiest_hubs))
        .route("/hubs/load-delay", get(hub_load_and_delay))
        .route("/routes/top-city-pairs", get(top_city_pairs))
        .route("/routes/busiest", get(busiest_routes))
        .route("/routes/delay-risk", get(delay_risk_overview))
        .route("/simulate/closure", get(simulate_closure))
        .route("/simulate/alternates", get(simulate_alternates))
        .route("/stats", get(stats))
        .with_state(state)
}

/// Bind and serve until ctrl-c
pub async fn serve(state: AppState, bind: SocketAddr) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .with_context(|| format!("Failed to bind {}", bind))?;
    tracing::info!("Listening on http://{}", bind);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server shutdown")?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        return;
    }
    tracing::info!("Shutting down");
}

async fn blocking<T, F>(work: F) -> ApiResult<T>
where
    F: FnOnce() -> airroute_vector::error::Result<T> + Send + 'static,
    T: Send + 'static,
{
    Ok(tokio::task::spawn_blocking(work).await??)
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn similar_by_route(
    State(state): State<AppState>,
    Query(params): Query<ByRouteParams>,
) -> ApiResult<Json<Vec<Neighbor>>> {
    let search = state.search.clone();
    let k = search.config().top_k(params.top_k);
    let neighbors = blocking(move || search.similar_by_id(params.route_id, k)).await?;
    Ok(Json(neighbors))
}

async fn similar_by_text(
    State(state): State<AppState>,
    Query(params): Query<ByTextParams>,
) -> ApiResult<Json<Vec<TextMatch>>> {
    let search = state.search.clone();
    let k = search.config().top_k(params.top_k);
    let matches = blocking(move || search.similar_by_text(&params.q, k)).await?;
    Ok(Json(matches))
}

async fn busiest_hubs(
    State(state): State<AppState>,
    Query(params): Query<LimitParams>,
) -> ApiResult<Json<Vec<Hub>>> {
    let store = state.store.clone();
    let hubs = blocking(move || {
        Ok(analytics::busiest_hubs(
            &store.routes()?,
            &store.airports()?,
            params.limit,
        ))
    })
    .await?;
    Ok(Json(hubs))
}

async fn top_city_pairs(
    State(state): State<AppState>,
    Query(params): Query<LimitParams>,
) -> ApiResult<Json<Vec<CityPair>>> {
    let store = state.store.clone();
    let pairs = blocking(move || {
        Ok(analytics::top_city_pairs(
            &store.routes()?,
            &store.airports()?,
            params.limit,
        ))
    })
    .await?;
    Ok(Json(pairs))
}

async fn hub_load_and_delay(
    State(state): State<AppState>,
    Query(params): Query<WideLimitParams>,
) -> ApiResult<Json<Vec<HubLoad>>> {
    let store = state.store.clone();
    let hubs = blocking(move || {
        Ok(analytics::hub_load_and_delay(
            &store.routes()?,
            &store.airports()?,
            &store.passenger_stats()?,
            params.limit,
        ))
    })
    .await?;
    Ok(Json(hubs))
}

async fn busiest_routes(
    State(state): State<AppState>,
    Query(params): Query<WideLimitParams>,
) -> ApiResult<Json<Vec<RouteFrequency>>> {
    let store = state.store.clone();
    let ranked = blocking(move || {
        Ok(analytics::busiest_routes(
            &store.routes()?,
            &store.airports()?,
            params.limit,
        ))
    })
    .await?;
    Ok(Json(ranked))
}

async fn delay_risk_overview(
    State(state): State<AppState>,
    Query(params): Query<RiskLimitParams>,
) -> ApiResult<Json<Vec<RouteRisk>>> {
    let store = state.store.clone();
    let ranked = blocking(move || {
        Ok(analytics::delay_risk_overview(
            &store.routes()?,
            &store.airports()?,
            &store.delay_risks()?,
            params.limit,
        ))
    })
    .await?;
    Ok(Json(ranked))
}

async fn simulate_closure(
    State(state): State<AppState>,
    Query(params): Query<ClosureParams>,
) -> ApiResult<Json<Vec<AffectedRoute>>> {
    let store = state.store.clone();
    let affected = blocking(move || {
        Ok(analytics::simulate_closure(
            &store.routes()?,
            &store.airports()?,
            &store.passenger_stats()?,
            params.airport_id,
        ))
    })
    .await?;
    Ok(Json(affected))
}

async fn simulate_alternates(
    State(state): State<AppState>,
    Query(params): Query<AlternatesParams>,
) -> ApiResult<Json<Vec<AffectedRoute>>> {
    let store = state.store.clone();
    let alternates = blocking(move || {
        Ok(analytics::suggest_alternates(
            &store.routes()?,
            &store.airports()?,
            params.airport_id,
            params.top_k,
        ))
    })
    .await?;
    Ok(Json(alternates))
}

async fn stats(State(state): State<AppState>) -> ApiResult<Json<serde_json::Value>> {
    let store = state.store.clone();
    let stats = blocking(move || store.stats()).await?;
    Ok(Json(stats))
}
