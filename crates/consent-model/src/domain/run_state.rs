use std::fmt;

use serde::{Deserialize, Serialize};

/// Lifecycle state of the recovery run controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RunState {
    /// No run in progress.
    Idle,
    /// A run is processing submissions.
    Running,
    /// Every fetched submission was processed.
    Completed,
    /// The run observed the kill switch and stopped early.
    Killed,
    /// Fetching submissions failed before any processing.
    Failed,
}

impl RunState {
    /// Returns `true` for states a run ends in.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RunState::Completed | RunState::Killed | RunState::Failed
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RunState::Idle => "idle",
            RunState::Running => "running",
            RunState::Completed => "completed",
            RunState::Killed => "killed",
            RunState::Failed => "failed",
        }
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
