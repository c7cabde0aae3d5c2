use consent_model::RateLimitSignal;
use reqwest::header::HeaderMap;

const REMAINING: &str = "x-hubspot-ratelimit-remaining";
const MAX: &str = "x-hubspot-ratelimit-max";
const INTERVAL_MS: &str = "x-hubspot-ratelimit-interval-milliseconds";
const RETRY_AFTER: &str = "retry-after";

/// Window assumed when the interval header is missing.
const DEFAULT_WINDOW_SECS: f64 = 10.0;

fn header<T: std::str::FromStr>(headers: &HeaderMap, name: &str) -> Option<T> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse().ok())
}

/// Read the rate-limit signal of a response.
///
/// `Retry-After` gives the seconds to reset; without it the whole window is
/// assumed. A `Retry-After` with no budget headers (plain 429) means nothing
/// is left.
pub fn parse_signal(headers: &HeaderMap) -> Option<RateLimitSignal> {
    let retry_after: Option<f64> = header(headers, RETRY_AFTER);
    let remaining: u64 = match header(headers, REMAINING) {
        Some(remaining) => remaining,
        None if retry_after.is_some() => 0,
        None => return None,
    };

    let window_seconds = header::<f64>(headers, INTERVAL_MS)
        .map(|ms| ms / 1000.0)
        .filter(|s| s.is_finite() && *s > 0.0)
        .unwrap_or(DEFAULT_WINDOW_SECS);
    let seconds_to_reset = retry_after.unwrap_or(window_seconds);

    let signal = RateLimitSignal::new(remaining, window_seconds, seconds_to_reset);
    Some(match header::<u64>(headers, MAX) {
        Some(max) => signal.with_max(max),
        None => signal,
    })
}
