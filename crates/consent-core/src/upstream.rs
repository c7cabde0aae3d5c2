use async_trait::async_trait;
use consent_model::{ConsentValues, RateLimitSignal, RawSubmission};

use crate::error::UpstreamError;

/// Upstream response value together with the rate-limit signal it carried.
#[derive(Debug, Clone)]
pub struct Paced<T> {
    pub value: T,
    pub signal: Option<RateLimitSignal>,
}

impl<T> Paced<T> {
    pub fn new(value: T, signal: Option<RateLimitSignal>) -> Self {
        Self { value, signal }
    }

    /// Value from a response without rate-limit headers.
    pub fn bare(value: T) -> Self {
        Self {
            value,
            signal: None,
        }
    }
}

/// One page of form submissions.
#[derive(Debug, Clone, Default)]
pub struct SubmissionPage {
    pub results: Vec<RawSubmission>,
    /// Cursor of the following page; `None` on the last page.
    pub next: Option<String>,
}

/// Forms + CRM service the pipeline talks to.
///
/// Implementations perform exactly one HTTP call per method and never sleep;
/// pacing is the caller's job.
#[async_trait]
pub trait Upstream: Send + Sync + 'static {
    /// Fetch one page of submissions for `form_id`, starting at cursor `after`.
    async fn fetch_submissions(
        &self,
        form_id: &str,
        page_size: u32,
        after: Option<&str>,
    ) -> Result<Paced<SubmissionPage>, UpstreamError>;

    /// Exact-match search of contacts by email. Returns matching contact ids.
    async fn search_contacts(&self, email: &str) -> Result<Paced<Vec<String>>, UpstreamError>;

    /// Partial update setting exactly `properties` on the contact.
    async fn update_contact(
        &self,
        contact_id: &str,
        properties: &ConsentValues,
    ) -> Result<Paced<()>, UpstreamError>;
}
