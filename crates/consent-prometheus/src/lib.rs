//! Prometheus metrics backend for consent recovery runs.
//!
//! This crate provides a [`PrometheusMetrics`] implementation of [`consent_core::MetricsBackend`] that exposes metrics in Prometheus format.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use consent_core::{MetricsBackend, MetricsHandle, PacingPolicy, RateLimiter};
//! use consent_model::RunState;
//! use consent_prometheus::PrometheusMetrics;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let metrics = PrometheusMetrics::new()?;
//! let handle: MetricsHandle = Arc::new(metrics.clone());
//!
//! let limiter = RateLimiter::new(PacingPolicy::default()).with_metrics(handle);
//! # let _ = limiter;
//!
//! metrics.record_run(RunState::Completed);
//!
//! // Body of a `/metrics` response.
//! let body = metrics.encode()?;
//! assert!(body.contains(r#"consent_runs_total{state="completed"} 1"#));
//! # Ok(())
//! # }
//! ```
//!
//! ## Metrics
//! - `consent_submissions_total{outcome}` - Counter
//! - `consent_runs_total{state}` - Counter
//! - `consent_pacing_delay_seconds` - Histogram
//!
//! ## HTTP Server
//! This crate does NOT provide HTTP server for `/metrics` endpoint.
//! The daemon mounts [`PrometheusMetrics::encode`] on its own router.

mod backend;
pub use backend::PrometheusMetrics;

pub use prometheus::{Encoder, Registry, TextEncoder};
