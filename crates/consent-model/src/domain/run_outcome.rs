use serde::{Deserialize, Serialize};
use std::time::SystemTime;

use crate::{RunId, RunState};

/// Per-run tallies. Every processed submission lands in exactly one bucket.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunCounters {
    pub processed: u64,
    pub updated: u64,
    pub skipped: u64,
    pub errors: u64,
}

impl RunCounters {
    pub fn record_updated(&mut self) {
        self.updated += 1;
        self.processed += 1;
    }

    pub fn record_skipped(&mut self) {
        self.skipped += 1;
        self.processed += 1;
    }

    pub fn record_error(&mut self) {
        self.errors += 1;
        self.processed += 1;
    }

    /// `processed == updated + skipped + errors`.
    pub fn is_balanced(&self) -> bool {
        self.processed == self.updated + self.skipped + self.errors
    }
}

/// Final result of one run, returned to the trigger caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunOutcome {
    pub run_id: RunId,
    /// Terminal state the run ended in.
    pub state: RunState,
    pub dry_run: bool,
    pub form_id: String,
    #[serde(flatten)]
    pub counters: RunCounters,
    #[serde(with = "time_serde")]
    pub started_at: SystemTime,
    #[serde(with = "time_serde")]
    pub finished_at: SystemTime,
    /// Failure reason for `Failed` runs.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

mod time_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::{SystemTime, UNIX_EPOCH};

    pub fn serialize<S>(time: &SystemTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let since_epoch = time
            .duration_since(UNIX_EPOCH)
            .map_err(serde::ser::Error::custom)?;
        since_epoch.as_secs().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<SystemTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(UNIX_EPOCH + std::time::Duration::from_secs(secs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(error: Option<String>) -> RunOutcome {
        let mut counters = RunCounters::default();
        counters.record_updated();
        counters.record_skipped();
        counters.record_skipped();
        RunOutcome {
            run_id: RunId::from("run-1"),
            state: RunState::Completed,
            dry_run: true,
            form_id: "form-1".into(),
            counters,
            started_at: SystemTime::now(),
            finished_at: SystemTime::now(),
            error,
        }
    }

    #[test]
    fn counters_stay_balanced() {
        let mut c = RunCounters::default();
        c.record_updated();
        c.record_error();
        c.record_skipped();
        assert_eq!(c.processed, 3);
        assert!(c.is_balanced());
    }

    #[test]
    fn outcome_serializes_flat_counters() {
        let json = serde_json::to_value(outcome(None)).unwrap();
        assert_eq!(json["dryRun"], true);
        assert_eq!(json["processed"], 3);
        assert_eq!(json["updated"], 1);
        assert_eq!(json["skipped"], 2);
        assert_eq!(json["errors"], 0);
        assert_eq!(json["state"], "completed");
        assert!(json.get("error").is_none());
    }

    #[test]
    fn outcome_serde_roundtrip_keeps_error() {
        let json = serde_json::to_string(&outcome(Some("boom".into()))).unwrap();
        let back: RunOutcome = serde_json::from_str(&json).unwrap();
        assert_eq!(back.error.as_deref(), Some("boom"));
        assert_eq!(back.counters.processed, 3);
    }
}
