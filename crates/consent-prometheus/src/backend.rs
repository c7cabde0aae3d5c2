use std::time::Duration;

use consent_core::{MetricsBackend, SubmissionOutcome};
use consent_model::RunState;
use prometheus::{
    Histogram, HistogramOpts, IntCounterVec, Opts, Registry, TextEncoder, proto::MetricFamily,
};

/// Pacing sleeps range from the floor (hundreds of ms) to the cap (seconds).
const PACING_BUCKETS: &[f64] = &[0.1, 0.25, 0.3, 0.5, 1.0, 2.0, 5.0, 10.0, 30.0];

/// Prometheus-backed [`MetricsBackend`]. Clones share the same registry.
#[derive(Clone)]
pub struct PrometheusMetrics {
    registry: Registry,
    submissions: IntCounterVec,
    runs: IntCounterVec,
    pacing: Histogram,
}

impl PrometheusMetrics {
    /// Build the collectors on a fresh registry.
    pub fn new() -> Result<Self, prometheus::Error> {
        Self::with_registry(Registry::new())
    }

    pub fn with_registry(registry: Registry) -> Result<Self, prometheus::Error> {
        let submissions = IntCounterVec::new(
            Opts::new(
                "consent_submissions_total",
                "Processed form submissions by outcome",
            ),
            &["outcome"],
        )?;
        let runs = IntCounterVec::new(
            Opts::new("consent_runs_total", "Finished runs by terminal state"),
            &["state"],
        )?;
        let pacing = Histogram::with_opts(
            HistogramOpts::new(
                "consent_pacing_delay_seconds",
                "Delay slept between upstream requests",
            )
            .buckets(PACING_BUCKETS.to_vec()),
        )?;

        registry.register(Box::new(submissions.clone()))?;
        registry.register(Box::new(runs.clone()))?;
        registry.register(Box::new(pacing.clone()))?;

        Ok(Self {
            registry,
            submissions,
            runs,
            pacing,
        })
    }

    pub fn gather(&self) -> Vec<MetricFamily> {
        self.registry.gather()
    }

    /// Text exposition format, ready to serve on `/metrics`.
    pub fn encode(&self) -> Result<String, prometheus::Error> {
        TextEncoder::new().encode_to_string(&self.gather())
    }
}

impl MetricsBackend for PrometheusMetrics {
    fn record_submission(&self, outcome: SubmissionOutcome) {
        self.submissions
            .with_label_values(&[outcome.as_str()])
            .inc();
    }

    fn record_run(&self, state: RunState) {
        self.runs.with_label_values(&[state.as_str()]).inc();
    }

    fn record_pacing(&self, delay: Duration) {
        self.pacing.observe(delay.as_secs_f64());
    }
}
