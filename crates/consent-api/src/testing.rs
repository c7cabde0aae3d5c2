use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use consent_core::{
    PacingPolicy, Paced, RateLimiter, RunController, SubmissionPage, Upstream, UpstreamError,
};
use consent_model::{ConsentMapping, ConsentValues, RunParams};
use tokio::sync::Semaphore;

use crate::adapter::ControllerApiAdapter;

/// Upstream with no submissions whose page fetch waits on a semaphore.
pub struct GatedUpstream {
    gate: Arc<Semaphore>,
}

impl GatedUpstream {
    pub fn open() -> Self {
        Self {
            gate: Arc::new(Semaphore::new(Semaphore::MAX_PERMITS)),
        }
    }

    pub fn closed() -> (Self, Arc<Semaphore>) {
        let gate = Arc::new(Semaphore::new(0));
        (
            Self {
                gate: Arc::clone(&gate),
            },
            gate,
        )
    }
}

#[async_trait]
impl Upstream for GatedUpstream {
    async fn fetch_submissions(
        &self,
        _form_id: &str,
        _page_size: u32,
        _after: Option<&str>,
    ) -> Result<Paced<SubmissionPage>, UpstreamError> {
        let _permit = self
            .gate
            .acquire()
            .await
            .map_err(|e| UpstreamError::Transport(e.to_string()))?;
        Ok(Paced::bare(SubmissionPage {
            results: Vec::new(),
            next: None,
        }))
    }

    async fn search_contacts(&self, _email: &str) -> Result<Paced<Vec<String>>, UpstreamError> {
        Ok(Paced::bare(Vec::new()))
    }

    async fn update_contact(
        &self,
        _contact_id: &str,
        _properties: &ConsentValues,
    ) -> Result<Paced<()>, UpstreamError> {
        Ok(Paced::bare(()))
    }
}

pub fn controller(upstream: impl Upstream) -> Arc<RunController> {
    let mapping: ConsentMapping = "email_consent=portal_terms".parse().unwrap();
    let limiter = RateLimiter::new(PacingPolicy::new(
        Duration::from_millis(1),
        Duration::from_millis(1),
    ));
    Arc::new(RunController::new(
        Arc::new(upstream),
        limiter,
        RunParams::new("form-1", mapping),
    ))
}

pub fn adapter(upstream: impl Upstream) -> (ControllerApiAdapter, Arc<RunController>) {
    let controller = controller(upstream);
    (ControllerApiAdapter::new(Arc::clone(&controller)), controller)
}
