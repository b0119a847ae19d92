use std::path::PathBuf;
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use tower_http::cors::CorsLayer;

use sherpa_core::{validate_payload, ValidationError};
use sherpa_ledger::{EventSink, JsonlSink};

// ── Config ──

pub struct ServeConfig {
    pub bind: String,
    pub port: u16,
    pub log_path: PathBuf,
}

// ── App State ──

#[derive(Clone)]
pub struct AppState {
    sink: Arc<dyn EventSink>,
}

impl AppState {
    pub fn new(sink: Arc<dyn EventSink>) -> Self {
        Self { sink }
    }
}

// ── Error Handling ──

/// Client-facing rejection. Only the validator's message leaves the server.
struct ApiError(ValidationError);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.0.status_code()).unwrap_or(StatusCode::BAD_REQUEST);
        let body = serde_json::json!({ "error": self.0.to_string() });
        (status, Json(body)).into_response()
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        Self(err)
    }
}

// ── Entrypoint ──

pub async fn serve(config: ServeConfig) -> anyhow::Result<()> {
    let sink = JsonlSink::new(&config.log_path);
    let app = router(AppState::new(Arc::new(sink)));

    let addr = format!("{}:{}", config.bind, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(%addr, log = %config.log_path.display(), "sherpa ingest listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    tracing::info!("sherpa ingest stopped");
    Ok(())
}

/// Build the router (for testing without binding to a port).
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/track", post(post_track))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "ctrl-c handler unavailable");
        std::future::pending::<()>().await;
    }
}

// ── Health ──

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "ok": true }))
}

// ── POST /api/track ──

async fn post_track(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<serde_json::Value>, ApiError> {
    let value: serde_json::Value =
        serde_json::from_slice(&body).map_err(|_| ValidationError::InvalidJson)?;
    let event = validate_payload(&value)?;

    // The sink swallows its own errors; a panicked writer thread is ignored too.
    let sink = Arc::clone(&state.sink);
    if let Err(e) = tokio::task::spawn_blocking(move || sink.record(event)).await {
        tracing::warn!(error = %e, "telemetry writer task failed");
    }

    Ok(Json(serde_json::json!({ "ok": true })))
}

// ── Tests ──
