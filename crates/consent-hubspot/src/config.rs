use std::{fmt, time::Duration};

pub const DEFAULT_BASE_URL: &str = "https://api.hubapi.com";

#[derive(Clone)]
pub struct HubSpotConfig {
    /// API root, without trailing slash.
    pub base_url: String,
    /// Private app token sent as bearer auth.
    pub token: String,
    /// Per-request timeout enforced by the http client.
    pub timeout: Duration,
}

impl HubSpotConfig {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            token: token.into(),
            timeout: Duration::from_secs(30),
        }
    }
}

impl fmt::Debug for HubSpotConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HubSpotConfig")
            .field("base_url", &self.base_url)
            .field("token", &"<redacted>")
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_hides_token() {
        let out = format!("{:?}", HubSpotConfig::new("pat-na1-secret"));
        assert!(!out.contains("secret"));
        assert!(out.contains("api.hubapi.com"));
    }
}
