//! Dashboard server for the listings explorer.
//!
//! Loads the dataset once at startup, then answers filter interactions
//! with freshly projected map specifications.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use clap::Parser;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};
use uuid::Uuid;

use barrios::config::Config;
use barrios::filter::{ControlSurface, FilterState};
use barrios::projection::{project_choropleth, project_clusters, project_points};
use barrios::query::apply;
use barrios::session::SessionStore;
use barrios::summary::Summary;
use barrios::Dataset;

mod params;
use params::{
    ChoroplethQueryParams, EventStatus, FilterEvent, FilterEventResponse, HealthResponse,
    PointsQueryParams, PointsResponse, SessionCreated,
};

#[derive(Parser, Debug)]
#[command(name = "serve")]
#[command(about = "Neighborhood listings dashboard server")]
struct Args {
    /// TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Listen address (overrides config)
    #[arg(short, long)]
    listen: Option<String>,

    /// Listings CSV (overrides config)
    #[arg(long)]
    listings: Option<PathBuf>,

    /// Neighborhood polygons CSV (overrides config)
    #[arg(long)]
    neighborhoods: Option<PathBuf>,

    /// Pre-clustered listings CSV (overrides config)
    #[arg(long)]
    clustered: Option<PathBuf>,
}

/// Application state shared across handlers
struct AppState {
    dataset: Arc<Dataset>,
    sessions: SessionStore,
    config: Config,
    summary: Summary,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => Config::load_from_file(path)?,
        None => Config::default(),
    };
    if let Some(listen) = args.listen {
        config.server.listen = listen;
    }
    if let Some(path) = args.listings {
        config.data.listings = path;
    }
    if let Some(path) = args.neighborhoods {
        config.data.neighborhoods = path;
    }
    if args.clustered.is_some() {
        config.data.clustered = args.clustered;
    }

    info!("Barrios dashboard server");

    let dataset = Dataset::load_from_paths(&config.data).context("Failed to load dataset")?;
    let summary = Summary::compute(&dataset, config.snapshot_year);

    let state = Arc::new(AppState {
        dataset: Arc::new(dataset),
        sessions: SessionStore::new(config.server.max_sessions),
        summary,
        config,
    });

    // Build router
    let app = Router::new()
        .route("/health", get(health_handler))
        .route("/v1/controls", get(controls_handler))
        .route("/v1/summary", get(summary_handler))
        .route("/v1/map/points", get(points_handler))
        .route("/v1/map/choropleth", get(choropleth_handler))
        .route("/v1/map/clusters", get(clusters_handler))
        .route("/v1/neighborhoods.geojson", get(features_handler))
        .route("/v1/sessions", post(create_session_handler))
        .route("/v1/sessions/{id}/filter", post(filter_event_handler))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(Arc::clone(&state));

    info!("Starting server on {}", state.config.server.listen);

    let listener = tokio::net::TcpListener::bind(&state.config.server.listen).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Health check endpoint
async fn health_handler(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        listings: state.dataset.listings().len(),
        neighborhoods: state.dataset.neighborhoods().len(),
        sessions: state.sessions.len(),
    })
}

/// Slider bounds, room options and default filter
async fn controls_handler(State(state): State<Arc<AppState>>) -> Json<ControlSurface> {
    Json(ControlSurface::from_bounds(state.dataset.bounds()))
}

async fn summary_handler(State(state): State<Arc<AppState>>) -> Json<Summary> {
    Json(state.summary.clone())
}

/// Filtered point map without a session
async fn points_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<PointsQueryParams>,
) -> Json<PointsResponse> {
    let bounds = state.dataset.bounds();
    let filter = params
        .to_filter(&FilterState::full(bounds))
        .sanitize(bounds);

    let subset = apply(&state.dataset, &filter);
    let map = project_points(
        subset,
        params.color.unwrap_or_default(),
        state.config.map.point_layout(),
    );

    Json(PointsResponse { filter, map })
}

/// Neighborhood polygons colored by an aggregate attribute
async fn choropleth_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ChoroplethQueryParams>,
) -> Response {
    let spec = project_choropleth(
        &state.dataset,
        params.attribute,
        state.config.map.choropleth_layout(),
    );
    Json(&spec).into_response()
}

/// Pre-clustered listings layer
async fn clusters_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Response, (StatusCode, String)> {
    let clustered = state.dataset.clustered().ok_or((
        StatusCode::NOT_FOUND,
        "No clustered listings table was loaded".to_string(),
    ))?;

    let spec = project_clusters(clustered, state.config.map.cluster_layout());
    Ok(Json(spec).into_response())
}

/// The neighborhood FeatureCollection
async fn features_handler(State(state): State<Arc<AppState>>) -> Response {
    Json(state.dataset.features()).into_response()
}

async fn create_session_handler(State(state): State<Arc<AppState>>) -> Json<SessionCreated> {
    let filter = FilterState::full(state.dataset.bounds());
    let session = state.sessions.create(filter);
    info!("Opened session {}", session.id());

    Json(SessionCreated {
        id: session.id(),
        filter,
    })
}

/// Apply one control event to a session.
///
/// The filter is sanitized, recomputed and projected; the result is only
/// returned as applied if no newer event for the session arrived meanwhile.
async fn filter_event_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(event): Json<FilterEvent>,
) -> Result<Json<FilterEventResponse>, (StatusCode, String)> {
    let session = state
        .sessions
        .get(&id)
        .ok_or((StatusCode::NOT_FOUND, format!("Unknown session {}", id)))?;

    let filter = event.filter.sanitize(state.dataset.bounds());

    let ticket = match session.submit(event.seq, filter) {
        Ok(ticket) => ticket,
        Err(stale) => {
            debug!(
                "Session {}: event {} arrived after {}",
                id, event.seq, stale.latest
            );
            return Ok(Json(FilterEventResponse {
                status: EventStatus::Superseded,
                seq: event.seq,
                filter: session.applied(),
                latest: Some(stale.latest),
                map: None,
            }));
        }
    };

    let subset = apply(&state.dataset, &ticket.filter);
    let map = project_points(subset, event.color, state.config.map.point_layout());

    if !session.commit(&ticket) {
        return Ok(Json(FilterEventResponse {
            status: EventStatus::Superseded,
            seq: ticket.seq,
            filter: session.applied(),
            latest: session.latest_seq(),
            map: None,
        }));
    }

    Ok(Json(FilterEventResponse {
        status: EventStatus::Applied,
        seq: ticket.seq,
        filter: ticket.filter,
        latest: Some(ticket.seq),
        map: Some(map),
    }))
}
