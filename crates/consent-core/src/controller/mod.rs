//! Owner of a recovery run.
//!
//! A run walks `Idle -> Running -> {Completed, Killed, Failed} -> Idle`. Only one
//! run can be `Running`; a trigger that arrives meanwhile is rejected with
//! [`RunError::AlreadyRunning`] and changes nothing.
//!
//! Inside a run every submission goes through extract -> resolve -> update in
//! sequence and lands in exactly one of the `updated`/`skipped`/`errors`
//! buckets. The kill switch is a [`CancellationToken`] created fresh for every
//! run and polled between submissions and between fetched pages.
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::SystemTime;

use consent_model::{
    RawSubmission, RunCounters, RunId, RunOutcome, RunParams, RunRequest, RunState,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use crate::{
    error::RunError,
    extract::ConsentExtractor,
    fetcher::SubmissionFetcher,
    metrics::{MetricsHandle, NoopMetrics, SubmissionOutcome},
    pacing::RateLimiter,
    resolver::{ContactResolver, Resolution},
    select,
    updater::{ContactUpdater, UpdateOutcome},
    upstream::Upstream,
};

const PROGRESS_EVERY: u64 = 100;

pub struct RunController {
    upstream: Arc<dyn Upstream>,
    limiter: RateLimiter,
    defaults: RunParams,
    metrics: MetricsHandle,
    inner: Mutex<ControllerInner>,
}

struct ControllerInner {
    state: RunState,
    kill: CancellationToken,
    last: Option<RunOutcome>,
}

/// Puts the controller back to `Idle` when the run is over, even on panic.
struct RunSlot<'a> {
    controller: &'a RunController,
}

impl Drop for RunSlot<'_> {
    fn drop(&mut self) {
        self.controller.lock().state = RunState::Idle;
    }
}

/// Everything one run needs, borrowed for its duration.
struct RunContext<'a> {
    run_id: &'a RunId,
    params: &'a RunParams,
    kill: &'a CancellationToken,
    extractor: ConsentExtractor<'a>,
    resolver: ContactResolver<'a>,
    updater: ContactUpdater<'a>,
}

impl RunController {
    pub fn new(upstream: Arc<dyn Upstream>, limiter: RateLimiter, defaults: RunParams) -> Self {
        Self {
            upstream,
            limiter,
            defaults,
            metrics: Arc::new(NoopMetrics),
            inner: Mutex::new(ControllerInner {
                state: RunState::Idle,
                kill: CancellationToken::new(),
                last: None,
            }),
        }
    }

    pub fn with_metrics(mut self, metrics: MetricsHandle) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn defaults(&self) -> &RunParams {
        &self.defaults
    }

    pub fn state(&self) -> RunState {
        self.lock().state
    }

    /// Outcome of the most recent finished run in this process.
    pub fn last_outcome(&self) -> Option<RunOutcome> {
        self.lock().last.clone()
    }

    /// Raise the kill switch of the active run.
    ///
    /// Returns whether a run was active; with no active run this is a no-op.
    pub fn kill(&self) -> bool {
        let inner = self.lock();
        if inner.state == RunState::Running {
            inner.kill.cancel();
            info!("kill switch raised");
            true
        } else {
            debug!(state = %inner.state, "kill requested with no active run");
            false
        }
    }

    /// Execute one run with `request` layered over the configured defaults.
    #[instrument(level = "info", skip(self, request))]
    pub async fn trigger(&self, request: RunRequest) -> Result<RunOutcome, RunError> {
        let (kill, _slot) = self.begin()?;
        let params = request.resolve(&self.defaults)?;
        let run_id = RunId::generate();

        info!(
            %run_id,
            form_id = %params.form_id,
            dry_run = params.dry_run,
            page_size = params.page_size,
            max_submissions = ?params.max_submissions,
            dedupe = params.dedupe,
            "recovery run started"
        );

        let outcome = self.execute(run_id, &params, &kill).await;
        self.finish(&outcome);
        Ok(outcome)
    }

    fn lock(&self) -> MutexGuard<'_, ControllerInner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn begin(&self) -> Result<(CancellationToken, RunSlot<'_>), RunError> {
        let mut inner = self.lock();
        if inner.state == RunState::Running {
            warn!("trigger rejected, a run is already in progress");
            return Err(RunError::AlreadyRunning);
        }
        inner.state = RunState::Running;
        inner.kill = CancellationToken::new();
        Ok((inner.kill.clone(), RunSlot { controller: self }))
    }

    fn finish(&self, outcome: &RunOutcome) {
        self.metrics.record_run(outcome.state);
        let c = &outcome.counters;
        info!(
            run_id = %outcome.run_id,
            state = %outcome.state,
            dry_run = outcome.dry_run,
            processed = c.processed,
            updated = c.updated,
            skipped = c.skipped,
            errors = c.errors,
            "recovery run finished"
        );

        let mut inner = self.lock();
        inner.state = outcome.state;
        inner.last = Some(outcome.clone());
    }

    async fn execute(
        &self,
        run_id: RunId,
        params: &RunParams,
        kill: &CancellationToken,
    ) -> RunOutcome {
        let started_at = SystemTime::now();
        let mut counters = RunCounters::default();
        let done = |state: RunState, counters: RunCounters, error: Option<String>| RunOutcome {
            run_id: run_id.clone(),
            state,
            dry_run: params.dry_run,
            form_id: params.form_id.clone(),
            counters,
            started_at,
            finished_at: SystemTime::now(),
            error,
        };

        // Dedupe and resume need the whole form; the bound then applies to what is left.
        let narrows = params.dedupe || params.start_after_email.is_some();
        let fetch_bound = if narrows { None } else { params.max_submissions };

        let upstream = self.upstream.as_ref();
        let fetched = match SubmissionFetcher::new(upstream, &self.limiter)
            .fetch_all(&params.form_id, params.page_size, fetch_bound, kill)
            .await
        {
            Ok(fetched) => fetched,
            Err(e) => {
                if e.is_form_not_found() {
                    error!(%run_id, form_id = %params.form_id, "form not found or deleted");
                } else {
                    error!(%run_id, collected = e.collected, error = %e, "submission fetch failed");
                }
                return done(RunState::Failed, counters, Some(e.to_string()));
            }
        };
        if fetched.interrupted || kill.is_cancelled() {
            return done(RunState::Killed, counters, None);
        }

        let submissions = self.select(&run_id, fetched.submissions, params);
        let total = submissions.len();
        let ctx = RunContext {
            run_id: &run_id,
            params,
            kill,
            extractor: ConsentExtractor::new(&params.mapping),
            resolver: ContactResolver::new(upstream, &self.limiter),
            updater: ContactUpdater::new(upstream, &self.limiter),
        };

        let mut state = RunState::Completed;
        for (idx, raw) in submissions.iter().enumerate() {
            let outcome = self.process(&ctx, raw, idx + 1, total).await;
            match outcome {
                SubmissionOutcome::Updated => counters.record_updated(),
                SubmissionOutcome::Skipped => counters.record_skipped(),
                SubmissionOutcome::Error => counters.record_error(),
            }
            self.metrics.record_submission(outcome);

            if counters.processed % PROGRESS_EVERY == 0 {
                info!(
                    %run_id,
                    processed = counters.processed,
                    total,
                    updated = counters.updated,
                    skipped = counters.skipped,
                    errors = counters.errors,
                    "progress"
                );
            }

            if kill.is_cancelled() {
                warn!(%run_id, processed = counters.processed, total, "kill switch observed, stopping run");
                state = RunState::Killed;
                break;
            }
        }

        done(state, counters, None)
    }

    fn select(
        &self,
        run_id: &RunId,
        submissions: Vec<RawSubmission>,
        params: &RunParams,
    ) -> Vec<RawSubmission> {
        let mut submissions = submissions;
        if params.dedupe {
            let before = submissions.len();
            submissions = select::dedupe_latest(submissions);
            info!(%run_id, before, after = submissions.len(), "deduplicated submissions by email");
        }
        if let Some(email) = &params.start_after_email {
            let (rest, skipped) = select::resume_after(submissions, email);
            match skipped {
                Some(skipped) => info!(%run_id, %email, skipped, "resuming after email"),
                None => warn!(%run_id, %email, "resume email not found, starting from the beginning"),
            }
            submissions = rest;
        }
        if let Some(max) = params.max_submissions
            && submissions.len() > max
        {
            debug!(%run_id, max, available = submissions.len(), "submission limit reached");
            submissions.truncate(max);
        }
        submissions
    }

    /// Run one submission through the pipeline and log its audit line.
    async fn process(
        &self,
        ctx: &RunContext<'_>,
        raw: &RawSubmission,
        position: usize,
        total: usize,
    ) -> SubmissionOutcome {
        let run_id = ctx.run_id;
        let submission_id = raw.conversion_id.as_str();

        let Some(submission) = ctx.extractor.extract(raw) else {
            info!(
                %run_id, position, total, submission_id,
                email = raw.email().unwrap_or_default(),
                "skipped: no email or no consent fields to recover"
            );
            return SubmissionOutcome::Skipped;
        };
        let email = submission.email.as_str();

        let contact_id = match ctx.resolver.find_contact_id(email, ctx.kill).await {
            Resolution::Found(id) => id,
            Resolution::NotFound => {
                info!(%run_id, position, total, submission_id, email, "skipped: no matching contact");
                return SubmissionOutcome::Skipped;
            }
            Resolution::Ambiguous(matches) => {
                warn!(
                    %run_id, position, total, submission_id, email, matches,
                    "skipped: email matches several contacts, needs review"
                );
                return SubmissionOutcome::Skipped;
            }
            Resolution::Failed(cause) => {
                error!(%run_id, position, total, submission_id, email, %cause, "contact search failed");
                return SubmissionOutcome::Error;
            }
        };

        match ctx
            .updater
            .apply(&contact_id, &submission.consent_values, ctx.params.dry_run, ctx.kill)
            .await
        {
            UpdateOutcome::Updated { simulated } => {
                info!(
                    %run_id, position, total, submission_id, email,
                    contact_id = %contact_id,
                    simulated,
                    properties = ?submission.consent_values,
                    "updated consent properties"
                );
                SubmissionOutcome::Updated
            }
            UpdateOutcome::Error(cause) => {
                error!(
                    %run_id, position, total, submission_id, email,
                    contact_id = %contact_id,
                    %cause,
                    "contact update failed"
                );
                SubmissionOutcome::Error
            }
        }
    }
}
