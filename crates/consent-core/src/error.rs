use consent_model::{ModelError, RateLimitSignal};
use thiserror::Error;

/// Failure talking to the forms/CRM upstream.
#[derive(Error, Debug, Clone)]
pub enum UpstreamError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("upstream returned status {status}: {body}")]
    Status {
        status: u16,
        body: String,
        signal: Option<RateLimitSignal>,
    },

    #[error("resource not found: {0}")]
    NotFound(String),

    #[error("invalid upstream response: {0}")]
    InvalidResponse(String),
}

impl UpstreamError {
    /// Rate-limit signal carried by a failed response, if any.
    pub fn signal(&self) -> Option<&RateLimitSignal> {
        match self {
            UpstreamError::Status { signal, .. } => signal.as_ref(),
            _ => None,
        }
    }
}

/// Pagination failed; `collected` submissions had been fetched before.
#[derive(Error, Debug, Clone)]
#[error("fetching submissions failed after {collected} submissions: {source}")]
pub struct FetchError {
    pub collected: usize,
    #[source]
    pub source: UpstreamError,
}

impl FetchError {
    pub fn is_form_not_found(&self) -> bool {
        matches!(self.source, UpstreamError::NotFound(_))
    }
}

#[derive(Error, Debug)]
pub enum RunError {
    #[error("a recovery run is already in progress")]
    AlreadyRunning,

    #[error(transparent)]
    InvalidRequest(#[from] ModelError),
}
