//! Request pacing driven by upstream rate-limit headers.
//!
//! Every call to the upstream shares one lane: after each response the caller
//! hands the response's [`RateLimitSignal`] to [`RateLimiter::pace`], which
//! sleeps for [`RateLimiter::compute_delay`] before the next request goes out.
use std::sync::Arc;
use std::time::Duration;

use consent_model::RateLimitSignal;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use crate::metrics::{MetricsHandle, NoopMetrics};

const DEFAULT_FLOOR_MS: u64 = 300;
const DEFAULT_MAX_DELAY_MS: u64 = 10_000;
const DEFAULT_LOW_WATER_FRACTION: f64 = 0.1;
const DEFAULT_LOW_WATER_MIN: u64 = 5;

/// Constants of the pacing policy.
///
/// `max_delay` is never below `floor`, and `floor` is never zero.
#[derive(Debug, Clone, PartialEq)]
pub struct PacingPolicy {
    floor: Duration,
    max_delay: Duration,
    low_water_fraction: f64,
    low_water_min: u64,
}

impl PacingPolicy {
    pub fn new(floor: Duration, max_delay: Duration) -> Self {
        let floor = floor.max(Duration::from_millis(1));
        Self {
            floor,
            max_delay: max_delay.max(floor),
            low_water_fraction: DEFAULT_LOW_WATER_FRACTION,
            low_water_min: DEFAULT_LOW_WATER_MIN,
        }
    }

    /// Fraction of the window budget at or below which pacing slows down.
    pub fn with_low_water_fraction(mut self, fraction: f64) -> Self {
        if fraction.is_finite() {
            self.low_water_fraction = fraction.clamp(0.0, 1.0);
        }
        self
    }

    /// Absolute low-water mark used when the budget is unknown.
    pub fn with_low_water_min(mut self, remaining: u64) -> Self {
        self.low_water_min = remaining;
        self
    }

    pub fn floor(&self) -> Duration {
        self.floor
    }

    pub fn max_delay(&self) -> Duration {
        self.max_delay
    }

    fn low_water_mark(&self, signal: &RateLimitSignal) -> u64 {
        match signal.max {
            Some(max) => (max as f64 * self.low_water_fraction).ceil() as u64,
            None => self.low_water_min,
        }
    }
}

impl Default for PacingPolicy {
    fn default() -> Self {
        Self::new(
            Duration::from_millis(DEFAULT_FLOOR_MS),
            Duration::from_millis(DEFAULT_MAX_DELAY_MS),
        )
    }
}

/// Turns rate-limit signals into sleeps.
#[derive(Clone)]
pub struct RateLimiter {
    policy: PacingPolicy,
    metrics: MetricsHandle,
}

impl RateLimiter {
    pub fn new(policy: PacingPolicy) -> Self {
        Self {
            policy,
            metrics: Arc::new(NoopMetrics),
        }
    }

    pub fn with_metrics(mut self, metrics: MetricsHandle) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn policy(&self) -> &PacingPolicy {
        &self.policy
    }

    /// Delay before the next request, always within `[floor, max_delay]`.
    pub fn compute_delay(&self, signal: Option<&RateLimitSignal>) -> Duration {
        let floor = self.policy.floor;
        let Some(signal) = signal else {
            return floor;
        };
        if signal.remaining > self.policy.low_water_mark(signal) {
            return floor;
        }

        let secs = signal.seconds_to_reset / signal.remaining.max(1) as f64;
        if !secs.is_finite() || secs <= 0.0 {
            return floor;
        }
        let capped = secs.min(self.policy.max_delay.as_secs_f64());
        Duration::from_secs_f64(capped).clamp(floor, self.policy.max_delay)
    }

    /// Sleep for the computed delay. A cancelled token cuts the sleep short.
    pub async fn pace(
        &self,
        signal: Option<&RateLimitSignal>,
        cancel: &CancellationToken,
    ) -> Duration {
        let delay = self.compute_delay(signal);
        if delay > self.policy.floor {
            debug!(
                delay_ms = delay.as_millis() as u64,
                remaining = signal.map(|s| s.remaining),
                "upstream budget low, slowing down"
            );
        } else {
            trace!(delay_ms = delay.as_millis() as u64, "pacing");
        }
        self.metrics.record_pacing(delay);

        tokio::select! {
            _ = tokio::time::sleep(delay) => {}
            _ = cancel.cancelled() => {
                trace!("pacing sleep interrupted by kill switch");
            }
        }
        delay
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(PacingPolicy::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::Instant;

    fn limiter() -> RateLimiter {
        RateLimiter::new(PacingPolicy::new(
            Duration::from_millis(100),
            Duration::from_secs(5),
        ))
    }

    #[test]
    fn no_signal_returns_floor() {
        assert_eq!(limiter().compute_delay(None), Duration::from_millis(100));
    }

    #[test]
    fn plenty_of_budget_returns_floor() {
        let signal = RateLimitSignal::new(90, 10.0, 4.0).with_max(100);
        assert_eq!(
            limiter().compute_delay(Some(&signal)),
            Duration::from_millis(100)
        );
    }

    #[test]
    fn low_budget_spreads_remaining_requests_over_reset() {
        let signal = RateLimitSignal::new(4, 10.0, 2.0).with_max(100);
        assert_eq!(
            limiter().compute_delay(Some(&signal)),
            Duration::from_millis(500)
        );
    }

    #[test]
    fn exhausted_budget_waits_for_reset() {
        let signal = RateLimitSignal::new(0, 10.0, 3.0).with_max(100);
        assert_eq!(limiter().compute_delay(Some(&signal)), Duration::from_secs(3));
    }

    #[test]
    fn unknown_budget_uses_absolute_low_water() {
        let low = RateLimitSignal::new(2, 10.0, 1.0);
        assert_eq!(
            limiter().compute_delay(Some(&low)),
            Duration::from_millis(500)
        );

        let high = RateLimitSignal::new(50, 10.0, 1.0);
        assert_eq!(
            limiter().compute_delay(Some(&high)),
            Duration::from_millis(100)
        );
    }

    #[test]
    fn delay_is_capped() {
        let signal = RateLimitSignal::new(0, 3600.0, 3600.0).with_max(100);
        assert_eq!(limiter().compute_delay(Some(&signal)), Duration::from_secs(5));
    }

    #[test]
    fn garbage_signals_never_go_below_floor() {
        let l = limiter();
        for reset in [-5.0, 0.0, f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let signal = RateLimitSignal::new(0, 10.0, reset).with_max(100);
            let delay = l.compute_delay(Some(&signal));
            assert!(delay >= l.policy().floor(), "reset={reset} gave {delay:?}");
            assert!(delay <= l.policy().max_delay());
        }
    }

    #[test]
    fn policy_normalizes_bounds() {
        let policy = PacingPolicy::new(Duration::ZERO, Duration::ZERO);
        assert!(policy.floor() > Duration::ZERO);
        assert!(policy.max_delay() >= policy.floor());
    }

    #[tokio::test(start_paused = true)]
    async fn pace_sleeps_for_computed_delay() {
        let l = limiter();
        let signal = RateLimitSignal::new(1, 10.0, 2.0).with_max(100);
        let start = Instant::now();
        let delay = l.pace(Some(&signal), &CancellationToken::new()).await;
        assert_eq!(delay, Duration::from_secs(2));
        assert!(start.elapsed() >= Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn pace_returns_early_when_cancelled() {
        let l = limiter();
        let cancel = CancellationToken::new();
        cancel.cancel();
        let signal = RateLimitSignal::new(0, 10.0, 4.0).with_max(100);
        let start = Instant::now();
        l.pace(Some(&signal), &cancel).await;
        assert!(start.elapsed() < Duration::from_secs(4));
    }
}
