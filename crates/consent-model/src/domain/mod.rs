mod consent_mapping;
pub use consent_mapping::{ConsentField, ConsentMapping};

mod submission;
pub use submission::{ConsentValues, FieldValue, RawSubmission, Submission};

mod rate_limit;
pub use rate_limit::RateLimitSignal;

mod run_id;
pub use run_id::RunId;

mod run_state;
pub use run_state::RunState;

mod run_outcome;
pub use run_outcome::{RunCounters, RunOutcome};

mod run_request;
pub use run_request::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE, RunParams, RunRequest};

/// Form field that carries the submitter's email address.
pub const EMAIL_FIELD: &str = "email";
