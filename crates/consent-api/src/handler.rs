use async_trait::async_trait;
use consent_model::{RunOutcome, RunRequest, RunState};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// Reply to a kill request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KillAck {
    pub acknowledged: bool,
    pub was_running: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateView {
    pub state: RunState,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Health {
    pub status: String,
    pub dry_run_default: bool,
    pub hostname: String,
    pub uptime_seconds: u64,
    pub state: RunState,
}

/// Run control API handler.
///
/// This trait abstracts the backend implementation, allowing users to:
/// - Use the provided `ControllerApiAdapter`
/// - Implement custom handlers with additional logic (auth, audit, etc.)
#[async_trait]
pub trait ApiHandler: Send + Sync + 'static {
    /// Run a recovery pass to completion and return its outcome.
    async fn trigger_run(&self, request: RunRequest) -> Result<RunOutcome, ApiError>;

    /// Raise the kill switch of the active run, if any.
    async fn kill_run(&self) -> Result<KillAck, ApiError>;

    /// Outcome of the last finished run.
    async fn last_run(&self) -> Result<Option<RunOutcome>, ApiError>;

    async fn run_state(&self) -> Result<RunState, ApiError>;

    async fn health(&self) -> Result<Health, ApiError>;
}
