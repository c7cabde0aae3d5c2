use consent_model::RawSubmission;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::{
    error::FetchError,
    pacing::RateLimiter,
    upstream::{Paced, Upstream},
};

/// Result of paginating the submissions endpoint.
#[derive(Debug, Clone, Default)]
pub struct Fetched {
    /// Submissions in upstream order.
    pub submissions: Vec<RawSubmission>,
    pub pages: usize,
    /// The kill switch stopped pagination before the last page.
    pub interrupted: bool,
}

/// Pulls every page of a form's submissions into memory.
pub struct SubmissionFetcher<'a> {
    upstream: &'a dyn Upstream,
    limiter: &'a RateLimiter,
}

impl<'a> SubmissionFetcher<'a> {
    pub fn new(upstream: &'a dyn Upstream, limiter: &'a RateLimiter) -> Self {
        Self { upstream, limiter }
    }

    /// Fetch pages until the upstream runs out, `max_submissions` is reached,
    /// or `cancel` fires. The kill switch is checked before every request.
    #[instrument(level = "info", skip(self, cancel))]
    pub async fn fetch_all(
        &self,
        form_id: &str,
        page_size: u32,
        max_submissions: Option<usize>,
        cancel: &CancellationToken,
    ) -> Result<Fetched, FetchError> {
        let mut fetched = Fetched::default();
        let mut after: Option<String> = None;

        loop {
            if cancel.is_cancelled() {
                warn!(
                    pages = fetched.pages,
                    collected = fetched.submissions.len(),
                    "kill switch observed during pagination"
                );
                fetched.interrupted = true;
                break;
            }

            let Paced { value: page, signal } = self
                .upstream
                .fetch_submissions(form_id, page_size, after.as_deref())
                .await
                .map_err(|source| FetchError {
                    collected: fetched.submissions.len(),
                    source,
                })?;
            fetched.pages += 1;

            let count = page.results.len();
            fetched.submissions.extend(page.results);
            debug!(
                page = fetched.pages,
                count,
                total = fetched.submissions.len(),
                "fetched submissions page"
            );

            if let Some(max) = max_submissions
                && fetched.submissions.len() >= max
            {
                fetched.submissions.truncate(max);
                debug!(max, "submission limit reached");
                break;
            }

            match page.next {
                Some(cursor) if count > 0 && !cursor.is_empty() => after = Some(cursor),
                _ => break,
            }

            self.limiter.pace(signal.as_ref(), cancel).await;
        }

        info!(
            pages = fetched.pages,
            total = fetched.submissions.len(),
            interrupted = fetched.interrupted,
            "submission fetch finished"
        );
        Ok(fetched)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{UpstreamError, testing::FakeUpstream};

    fn subs(prefix: &str, n: usize) -> Vec<RawSubmission> {
        (0..n)
            .map(|i| FakeUpstream::submission(&format!("{prefix}{i}"), &format!("{prefix}{i}@x.io"), &[]))
            .collect()
    }

    fn ids(fetched: &Fetched) -> Vec<&str> {
        fetched
            .submissions
            .iter()
            .map(|s| s.conversion_id.as_str())
            .collect()
    }

    #[tokio::test(start_paused = true)]
    async fn collects_all_pages_in_order() {
        let upstream = FakeUpstream::with_pages(vec![subs("a", 2), subs("b", 2), subs("c", 1)]);
        let limiter = RateLimiter::default();

        let fetched = SubmissionFetcher::new(&upstream, &limiter)
            .fetch_all("form", 2, None, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(fetched.pages, 3);
        assert!(!fetched.interrupted);
        assert_eq!(ids(&fetched), vec!["a0", "a1", "b0", "b1", "c0"]);
        assert_eq!(upstream.fetch_cursors(), vec![None, Some("1".into()), Some("2".into())]);
    }

    #[tokio::test(start_paused = true)]
    async fn stops_at_max_submissions() {
        let upstream = FakeUpstream::with_pages(vec![subs("a", 2), subs("b", 2), subs("c", 2)]);
        let limiter = RateLimiter::default();

        let fetched = SubmissionFetcher::new(&upstream, &limiter)
            .fetch_all("form", 2, Some(3), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(ids(&fetched), vec!["a0", "a1", "b0"]);
        assert_eq!(fetched.pages, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn tolerates_empty_last_page() {
        let upstream = FakeUpstream::with_pages(vec![subs("a", 2), vec![]]);
        let limiter = RateLimiter::default();

        let fetched = SubmissionFetcher::new(&upstream, &limiter)
            .fetch_all("form", 2, None, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(fetched.submissions.len(), 2);
        assert_eq!(fetched.pages, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn failure_reports_partial_count() {
        let upstream = FakeUpstream::with_pages(vec![subs("a", 2), subs("b", 2), subs("c", 2)])
            .failing_fetch_at(2);
        let limiter = RateLimiter::default();

        let err = SubmissionFetcher::new(&upstream, &limiter)
            .fetch_all("form", 2, None, &CancellationToken::new())
            .await
            .unwrap_err();

        assert_eq!(err.collected, 4);
        assert!(matches!(err.source, UpstreamError::Status { status: 500, .. }));
        assert!(!err.is_form_not_found());
    }

    #[tokio::test(start_paused = true)]
    async fn missing_form_is_reported_as_such() {
        let upstream = FakeUpstream::with_pages(vec![subs("a", 2)]).missing_form();
        let limiter = RateLimiter::default();

        let err = SubmissionFetcher::new(&upstream, &limiter)
            .fetch_all("gone", 2, None, &CancellationToken::new())
            .await
            .unwrap_err();

        assert_eq!(err.collected, 0);
        assert!(err.is_form_not_found());
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_token_stops_before_first_request() {
        let upstream = FakeUpstream::with_pages(vec![subs("a", 2)]);
        let limiter = RateLimiter::default();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let fetched = SubmissionFetcher::new(&upstream, &limiter)
            .fetch_all("form", 2, None, &cancel)
            .await
            .unwrap();

        assert!(fetched.interrupted);
        assert_eq!(fetched.pages, 0);
        assert!(upstream.fetch_cursors().is_empty());
    }
}
