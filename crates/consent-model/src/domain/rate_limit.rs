/// Rate-limit state reported by the upstream on a single response.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RateLimitSignal {
    /// Requests left in the current window.
    pub remaining: u64,
    /// Window budget, when the upstream reports it.
    pub max: Option<u64>,
    /// Length of the limiting window.
    pub window_seconds: f64,
    /// Time until the window resets.
    pub seconds_to_reset: f64,
}

impl RateLimitSignal {
    pub fn new(remaining: u64, window_seconds: f64, seconds_to_reset: f64) -> Self {
        Self {
            remaining,
            max: None,
            window_seconds,
            seconds_to_reset,
        }
    }

    pub fn with_max(mut self, max: u64) -> Self {
        self.max = Some(max);
        self
    }
}
