use std::{sync::OnceLock, time::Instant};

static HOSTNAME: OnceLock<String> = OnceLock::new();
static START_TIME: OnceLock<Instant> = OnceLock::new();

/// Initialize process start time.
pub fn init_uptime() {
    START_TIME.get_or_init(Instant::now);
}

/// Get process uptime in seconds.
pub fn uptime_seconds() -> u64 {
    let start = START_TIME.get_or_init(Instant::now);
    start.elapsed().as_secs()
}

/// Host the service runs on, resolved once.
pub fn hostname() -> &'static str {
    HOSTNAME.get_or_init(|| {
        hostname::get()
            .ok()
            .and_then(|h| h.into_string().ok())
            .unwrap_or_else(|| "unknown-host".to_string())
    })
}
