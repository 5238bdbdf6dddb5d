//! HTTP server setup and shared state.

use std::sync::Arc;

use axum::{
    extract::{DefaultBodyLimit, State},
    response::Json,
    routing::{get, post},
    Router,
};
use tokio::sync::RwLock;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::board::BoardState;
use crate::config::Config;
use crate::extraction::Extractor;
use crate::intake::MAX_IMAGE_BYTES;
use crate::llm::{GeminiClient, RetryConfig, VisionClient};
use crate::service::AnalysisService;

use super::board;
use super::types::HealthResponse;

/// Room for multipart boundaries and headers on top of the image itself.
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    /// The single session board and its analysis pipeline
    pub service: AnalysisService,
}

impl AppState {
    /// Build state around an arbitrary vision client.
    pub fn new(config: Config, client: Arc<dyn VisionClient>) -> Self {
        let extractor = Extractor::new(client, config.extraction.model.clone());
        let board = Arc::new(RwLock::new(BoardState::new(config.hourly_rate)));
        Self {
            service: AnalysisService::new(board, extractor),
            config,
        }
    }
}

/// Assemble the API router.
pub fn build_router(state: Arc<AppState>) -> Router {
    let upload_route = Router::new()
        .route("/api/analyze", post(board::analyze))
        .layer(DefaultBodyLimit::max(MAX_IMAGE_BYTES + MULTIPART_OVERHEAD_BYTES));

    Router::new()
        .route("/api/health", get(health))
        .route("/api/board", get(board::get_board))
        .route("/api/board/reset", post(board::reset))
        .route("/api/board/tasks/:id/move", post(board::move_task))
        .merge(upload_route)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the HTTP server.
pub async fn serve(config: Config) -> anyhow::Result<()> {
    let client = GeminiClient::with_options(
        config.extraction.api_key.clone(),
        config.extraction.api_base.clone(),
        config.extraction.timeout,
        RetryConfig::with_max_retries(config.extraction.max_retries),
    )?;

    let state = Arc::new(AppState::new(config.clone(), Arc::new(client)));
    let app = build_router(state);

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

/// Wait for SIGINT/SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received; in-flight analyses are abandoned");
}

/// Health check endpoint.
async fn health(State(_state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
