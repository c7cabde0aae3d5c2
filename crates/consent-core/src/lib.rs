pub mod error;
pub use error::{FetchError, RunError, UpstreamError};

pub mod upstream;
pub use upstream::{Paced, SubmissionPage, Upstream};

pub mod pacing;
pub use pacing::{PacingPolicy, RateLimiter};

pub mod fetcher;
pub use fetcher::{Fetched, SubmissionFetcher};

pub mod extract;
pub use extract::ConsentExtractor;

pub mod select;

pub mod resolver;
pub use resolver::{ContactResolver, Resolution};

pub mod updater;
pub use updater::{ContactUpdater, UpdateOutcome};

pub mod metrics;
pub use metrics::{MetricsBackend, MetricsHandle, NoopMetrics, SubmissionOutcome};

pub mod controller;
pub use controller::RunController;

mod system;
pub use system::{hostname, init_uptime, uptime_seconds};

#[cfg(test)]
mod testing;
