use std::sync::Arc;

use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    response::IntoResponse,
    routing::{get, post},
};
use consent_model::RunRequest;

use crate::{
    error::ApiError,
    handler::{ApiHandler, StateView},
};

/// HTTP API service builder.
pub struct HttpApi<H> {
    handler: Arc<H>,
}

impl<H> HttpApi<H>
where
    H: ApiHandler,
{
    /// Create new HTTP API with the given handler.
    pub fn new(handler: Arc<H>) -> Self {
        Self { handler }
    }

    /// Build axum router with mounted endpoints.
    ///
    /// Routes:
    /// - POST /api/v1/runs - Trigger a run and wait for its outcome
    /// - POST /api/v1/runs/kill - Raise the kill switch
    /// - GET /api/v1/runs/last - Last finished run
    /// - GET /api/v1/runs/state - Current run state
    /// - GET /health - Liveness and defaults
    pub fn router(self) -> Router {
        Router::new()
            .route("/api/v1/runs", post(trigger_run::<H>))
            .route("/api/v1/runs/kill", post(kill_run::<H>))
            .route("/api/v1/runs/last", get(last_run::<H>))
            .route("/api/v1/runs/state", get(run_state::<H>))
            .route("/health", get(health::<H>))
            .with_state(self.handler)
    }
}

/// Empty body means "use the configured defaults".
fn parse_request(body: &[u8]) -> Result<RunRequest, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(RunRequest::default());
    }
    serde_json::from_slice(body).map_err(|e| ApiError::InvalidRequest(e.to_string()))
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /api/v1/runs
async fn trigger_run<H>(
    State(handler): State<Arc<H>>,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError>
where
    H: ApiHandler,
{
    let request = parse_request(&body)?;
    let outcome = handler.trigger_run(request).await?;
    Ok(Json(outcome))
}

/// POST /api/v1/runs/kill
async fn kill_run<H>(State(handler): State<Arc<H>>) -> Result<impl IntoResponse, ApiError>
where
    H: ApiHandler,
{
    Ok(Json(handler.kill_run().await?))
}

/// GET /api/v1/runs/last
async fn last_run<H>(State(handler): State<Arc<H>>) -> Result<impl IntoResponse, ApiError>
where
    H: ApiHandler,
{
    let outcome = handler
        .last_run()
        .await?
        .ok_or_else(|| ApiError::NotFound("no run has finished yet".to_string()))?;
    Ok(Json(outcome))
}

/// GET /api/v1/runs/state
async fn run_state<H>(State(handler): State<Arc<H>>) -> Result<impl IntoResponse, ApiError>
where
    H: ApiHandler,
{
    let state = handler.run_state().await?;
    Ok(Json(StateView { state }))
}

/// GET /health
async fn health<H>(State(handler): State<Arc<H>>) -> Result<impl IntoResponse, ApiError>
where
    H: ApiHandler,
{
    Ok(Json(handler.health().await?))
}
