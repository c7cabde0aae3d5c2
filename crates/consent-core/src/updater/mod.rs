use consent_model::ConsentValues;
use tokio_util::sync::CancellationToken;
use tracing::instrument;

use crate::{pacing::RateLimiter, upstream::Upstream};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// `simulated` is set for dry runs, where no write was issued.
    Updated { simulated: bool },
    Error(String),
}

pub struct ContactUpdater<'a> {
    upstream: &'a dyn Upstream,
    limiter: &'a RateLimiter,
}

impl<'a> ContactUpdater<'a> {
    pub fn new(upstream: &'a dyn Upstream, limiter: &'a RateLimiter) -> Self {
        Self { upstream, limiter }
    }

    /// Write `values` onto the contact, or only pace when `dry_run` is set.
    #[instrument(level = "debug", skip(self, values, cancel))]
    pub async fn apply(
        &self,
        contact_id: &str,
        values: &ConsentValues,
        dry_run: bool,
        cancel: &CancellationToken,
    ) -> UpdateOutcome {
        if dry_run {
            self.limiter.pace(None, cancel).await;
            return UpdateOutcome::Updated { simulated: true };
        }

        match self.upstream.update_contact(contact_id, values).await {
            Ok(response) => {
                self.limiter.pace(response.signal.as_ref(), cancel).await;
                UpdateOutcome::Updated { simulated: false }
            }
            Err(e) => {
                self.limiter.pace(e.signal(), cancel).await;
                UpdateOutcome::Error(e.to_string())
            }
        }
    }
}
