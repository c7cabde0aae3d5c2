use std::sync::Arc;
use std::time::Duration;

use consent_model::RunState;

/// Bucket a processed submission ended up in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionOutcome {
    Updated,
    Skipped,
    Error,
}

impl SubmissionOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubmissionOutcome::Updated => "updated",
            SubmissionOutcome::Skipped => "skipped",
            SubmissionOutcome::Error => "error",
        }
    }
}

/// Sink for run metrics. Implementations must be cheap and non-blocking.
pub trait MetricsBackend: Send + Sync {
    fn record_submission(&self, outcome: SubmissionOutcome);
    fn record_run(&self, state: RunState);
    fn record_pacing(&self, delay: Duration);
}

pub type MetricsHandle = Arc<dyn MetricsBackend>;

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopMetrics;

impl MetricsBackend for NoopMetrics {
    fn record_submission(&self, _outcome: SubmissionOutcome) {}
    fn record_run(&self, _state: RunState) {}
    fn record_pacing(&self, _delay: Duration) {}
}
