use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument};

use crate::{pacing::RateLimiter, upstream::Upstream};

/// Result of looking a contact up by email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Found(String),
    NotFound,
    /// More than one contact matched; never guessed.
    Ambiguous(usize),
    /// The search call itself failed.
    Failed(String),
}

pub struct ContactResolver<'a> {
    upstream: &'a dyn Upstream,
    limiter: &'a RateLimiter,
}

impl<'a> ContactResolver<'a> {
    pub fn new(upstream: &'a dyn Upstream, limiter: &'a RateLimiter) -> Self {
        Self { upstream, limiter }
    }

    /// Exact-match search by email, paced before returning.
    #[instrument(level = "debug", skip(self, cancel))]
    pub async fn find_contact_id(&self, email: &str, cancel: &CancellationToken) -> Resolution {
        match self.upstream.search_contacts(email).await {
            Ok(response) => {
                self.limiter.pace(response.signal.as_ref(), cancel).await;
                let mut ids = response.value;
                debug!(matches = ids.len(), "contact search finished");
                match ids.len() {
                    0 => Resolution::NotFound,
                    1 => Resolution::Found(ids.remove(0)),
                    n => Resolution::Ambiguous(n),
                }
            }
            Err(e) => {
                self.limiter.pace(e.signal(), cancel).await;
                Resolution::Failed(e.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeUpstream;

    #[tokio::test(start_paused = true)]
    async fn distinguishes_zero_one_and_many() {
        let upstream = FakeUpstream::default()
            .with_contact("one@x.io", &["c-1"])
            .with_contact("two@x.io", &["c-2", "c-3"]);
        let limiter = RateLimiter::default();
        let resolver = ContactResolver::new(&upstream, &limiter);
        let cancel = CancellationToken::new();

        assert_eq!(
            resolver.find_contact_id("one@x.io", &cancel).await,
            Resolution::Found("c-1".into())
        );
        assert_eq!(
            resolver.find_contact_id("two@x.io", &cancel).await,
            Resolution::Ambiguous(2)
        );
        assert_eq!(
            resolver.find_contact_id("none@x.io", &cancel).await,
            Resolution::NotFound
        );
    }

    #[tokio::test(start_paused = true)]
    async fn search_failure_is_reported() {
        let upstream = FakeUpstream::default().failing_search_for("bad@x.io");
        let limiter = RateLimiter::default();
        let resolver = ContactResolver::new(&upstream, &limiter);

        let res = resolver
            .find_contact_id("bad@x.io", &CancellationToken::new())
            .await;
        assert!(matches!(res, Resolution::Failed(_)));
    }
}
