//! Madrid Rental Price API Server
//!
//! REST API serving price predictions and property listings.

use anyhow::Context;
use axum::{
    body::Body,
    extract::State,
    http::Request,
    response::{Html, IntoResponse},
    routing::{get, post},
    Json, Router,
};
use data_validator::Validator;
use inference_engine::PricePredictor;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use serde::Serialize;
use std::net::SocketAddr;
use std::str::FromStr;
use std::sync::{Arc, OnceLock};
use std::time::Instant;
use storage::ListingRepository;
use tower_governor::GovernorLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, info_span, warn, Level};
use tracing_subscriber::FmtSubscriber;
use uuid::Uuid;

pub mod config;
pub mod error;
pub mod rate_limit;
mod routes;

pub use config::{AppConfig, LogConfig};
pub use error::ApiError;
pub use rate_limit::{create_governor_config, DefaultGovernorConfig, RateLimitConfig};

/// Application state shared across handlers.
///
/// Built once before the listener binds and never mutated afterwards.
pub struct AppState {
    pub predictor: Arc<PricePredictor>,
    pub validator: Validator,
    pub listings: ListingRepository,
    /// Prometheus exposition handle
    pub metrics: PrometheusHandle,
    pub version: String,
    pub start_time: Instant,
}

impl AppState {
    /// Create new application state
    pub fn new(
        predictor: PricePredictor,
        validator: Validator,
        listings: ListingRepository,
    ) -> Self {
        Self {
            predictor: Arc::new(predictor),
            validator,
            listings,
            metrics: install_metrics(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            start_time: Instant::now(),
        }
    }
}

/// Install the Prometheus recorder once per process and return its handle
pub fn install_metrics() -> PrometheusHandle {
    static HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();
    HANDLE
        .get_or_init(|| {
            let recorder = PrometheusBuilder::new().build_recorder();
            let handle = recorder.handle();
            if metrics::set_global_recorder(recorder).is_err() {
                warn!("A metrics recorder was already installed");
            }
            handle
        })
        .clone()
}

/// Health response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub components: ComponentStatus,
}

/// Loaded artifact summary
#[derive(Debug, Serialize)]
pub struct ComponentStatus {
    pub model: String,
    pub location_groups: usize,
    pub listings: usize,
}

/// Create the application router.
///
/// When `rate_limit` is set, the prediction route is limited per peer IP.
pub fn create_router(
    state: Arc<AppState>,
    rate_limit: Option<Arc<DefaultGovernorConfig>>,
) -> Router {
    let mut predict_routes =
        Router::new().route("/api/v1/predict", post(routes::predict::predict));
    if let Some(config) = rate_limit {
        predict_routes = predict_routes.layer(GovernorLayer { config });
    }

    Router::new()
        .route("/", get(index_handler))
        .route("/api/v1/health", get(health_handler))
        .route("/api/v1/listings", get(routes::listings::get_listings))
        .route(
            "/api/v1/listings/districts",
            get(routes::listings::get_district_summaries),
        )
        .route("/metrics", get(metrics_handler))
        .merge(predict_routes)
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                info_span!(
                    "request",
                    id = %Uuid::new_v4(),
                    method = %request.method(),
                    uri = %request.uri(),
                )
            }),
        )
        .layer(CorsLayer::permissive())
        .with_state(state)
}

const INDEX_PAGE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head><meta charset="utf-8"><title>Madrid Rental Price Prediction</title></head>
<body>
<h1>Madrid Rental Price Prediction</h1>
<p>Estimate the price of a property in Madrid from its features.</p>
<ul>
<li><code>POST /api/v1/predict</code> price estimate for a property</li>
<li><code>GET /api/v1/listings</code> listings filtered by district, rooms, bathrooms, price and area</li>
<li><code>GET /api/v1/listings/districts</code> listing count and prices per district</li>
<li><code>GET /api/v1/health</code> service status</li>
<li><code>GET /metrics</code> Prometheus metrics</li>
</ul>
</body>
</html>
"#;

async fn index_handler() -> Html<&'static str> {
    Html(INDEX_PAGE)
}

/// Health check handler
async fn health_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let response = HealthResponse {
        status: "healthy".to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
        version: state.version.clone(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        components: ComponentStatus {
            model: state.predictor.model_name().to_string(),
            location_groups: state.predictor.location_count(),
            listings: state.listings.len(),
        },
    };

    Json(response)
}

async fn metrics_handler(State(state): State<Arc<AppState>>) -> String {
    state.metrics.render()
}

/// Initialize logging
pub fn init_logging(config: &LogConfig) -> anyhow::Result<()> {
    let level = Level::from_str(&config.level)
        .with_context(|| format!("invalid log level {:?}", config.level))?;

    let builder = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true);

    let result = if config.json {
        tracing::subscriber::set_global_default(builder.json().finish())
    } else {
        tracing::subscriber::set_global_default(builder.finish())
    };
    result.context("failed to set tracing subscriber")
}

/// Load artifacts and listings into the shared state
pub fn load_state(config: &AppConfig) -> anyhow::Result<AppState> {
    let predictor = PricePredictor::load(&config.artifacts).context("failed to load artifacts")?;

    let listings = match &config.listings {
        Some(path) => ListingRepository::from_csv(path)
            .with_context(|| format!("failed to load listings from {}", path.display()))?,
        None => {
            warn!("No listings file configured");
            ListingRepository::default()
        }
    };

    Ok(AppState::new(
        predictor,
        Validator::new(config.validation.clone()),
        listings,
    ))
}

/// Run the server
pub async fn run_server(config: AppConfig) -> anyhow::Result<()> {
    let state = Arc::new(load_state(&config)?);

    let rate_limit = if config.rate_limit.enabled {
        let governor = create_governor_config(&config.rate_limit)
            .context("rate limit period and burst size must be non-zero")?;
        Some(governor)
    } else {
        None
    };
    let app = create_router(state, rate_limit);

    info!("Starting API server on {}", config.server.address);

    let listener = tokio::net::TcpListener::bind(&config.server.address).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
