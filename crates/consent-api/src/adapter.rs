use std::sync::Arc;

use async_trait::async_trait;
use consent_core::RunController;
use consent_model::{RunOutcome, RunRequest, RunState};
use tracing::warn;

use crate::error::ApiError;
use crate::handler::{ApiHandler, Health, KillAck};

/// Adapter that bridges `RunController` to `ApiHandler`.
///
/// Runs are driven on their own task so a dropped HTTP connection does not
/// abandon a run halfway; only the kill switch stops it.
pub struct ControllerApiAdapter {
    controller: Arc<RunController>,
}

impl ControllerApiAdapter {
    /// Create a new adapter wrapping the given controller.
    pub fn new(controller: Arc<RunController>) -> Self {
        Self { controller }
    }
}

#[async_trait]
impl ApiHandler for ControllerApiAdapter {
    async fn trigger_run(&self, request: RunRequest) -> Result<RunOutcome, ApiError> {
        let controller = Arc::clone(&self.controller);
        let run = tokio::spawn(async move { controller.trigger(request).await });

        match run.await {
            Ok(result) => result.map_err(ApiError::from),
            Err(e) => {
                warn!(error = %e, "run task did not complete");
                Err(ApiError::Internal(format!("run task failed: {e}")))
            }
        }
    }

    async fn kill_run(&self) -> Result<KillAck, ApiError> {
        Ok(KillAck {
            acknowledged: true,
            was_running: self.controller.kill(),
        })
    }

    async fn last_run(&self) -> Result<Option<RunOutcome>, ApiError> {
        Ok(self.controller.last_outcome())
    }

    async fn run_state(&self) -> Result<RunState, ApiError> {
        Ok(self.controller.state())
    }

    async fn health(&self) -> Result<Health, ApiError> {
        Ok(Health {
            status: "ok".to_string(),
            dry_run_default: self.controller.defaults().dry_run,
            hostname: consent_core::hostname().to_string(),
            uptime_seconds: consent_core::uptime_seconds(),
            state: self.controller.state(),
        })
    }
}
