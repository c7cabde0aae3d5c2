//! Process configuration read once from the environment.
use std::{
    net::{IpAddr, SocketAddr},
    path::PathBuf,
    str::FromStr,
    time::Duration,
};

use consent_core::PacingPolicy;
use consent_hubspot::{DEFAULT_BASE_URL, HubSpotConfig};
use consent_model::{ConsentMapping, DEFAULT_PAGE_SIZE, ModelError, RunParams};
use consent_observe::{LoggerConfig, LoggerError, LoggerFormat};
use thiserror::Error;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8000;
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_FLOOR_MS: u64 = 300;
const DEFAULT_MAX_DELAY_MS: u64 = 10_000;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),

    #[error("invalid value {value:?} for {key}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },

    #[error("invalid CONSENT_FIELDS: {0}")]
    Mapping(#[from] ModelError),

    #[error("invalid logger settings: {0}")]
    Logger(#[from] LoggerError),
}

#[derive(Debug, Clone)]
pub struct AgentConfig {
    pub hubspot: HubSpotConfig,
    /// Run parameters used when a trigger carries no overrides.
    pub defaults: RunParams,
    pub pacing: PacingPolicy,
    pub logger: LoggerConfig,
    pub bind: SocketAddr,
}

impl AgentConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let required = |key: &'static str| get(key).ok_or(ConfigError::Missing(key));

        let token = required("HUBSPOT_PRIVATE_APP_TOKEN")?;
        let form_id = required("HUBSPOT_FORM_ID")?;
        let mapping: ConsentMapping = required("CONSENT_FIELDS")?.parse()?;

        let hubspot = HubSpotConfig {
            base_url: get("HUBSPOT_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            timeout: Duration::from_secs(parse_or(
                "HTTP_TIMEOUT_SECS",
                get("HTTP_TIMEOUT_SECS"),
                DEFAULT_TIMEOUT_SECS,
            )?),
            ..HubSpotConfig::new(token)
        };

        let page_size: u32 = parse_or("PAGE_SIZE", get("PAGE_SIZE"), DEFAULT_PAGE_SIZE)?;
        if page_size == 0 {
            return Err(invalid("PAGE_SIZE", "0", "must be at least 1"));
        }
        let max_submissions = match get("MAX_SUBMISSIONS") {
            Some(raw) => Some(parse::<usize>("MAX_SUBMISSIONS", &raw)?),
            None => None,
        };
        if max_submissions == Some(0) {
            return Err(invalid("MAX_SUBMISSIONS", "0", "must be at least 1"));
        }
        let defaults = RunParams::new(form_id, mapping)
            .with_dry_run(parse_bool("DRY_RUN", get("DRY_RUN"), true)?)
            .with_dedupe(parse_bool("DEDUPE", get("DEDUPE"), false)?)
            .with_page_size(page_size)
            .with_max_submissions(max_submissions);

        let floor_ms = parse_or("PACING_FLOOR_MS", get("PACING_FLOOR_MS"), DEFAULT_FLOOR_MS)?;
        let max_ms = parse_or("PACING_MAX_MS", get("PACING_MAX_MS"), DEFAULT_MAX_DELAY_MS)?;
        let mut pacing =
            PacingPolicy::new(Duration::from_millis(floor_ms), Duration::from_millis(max_ms));
        if let Some(raw) = get("PACING_LOW_WATER_FRACTION") {
            let fraction: f64 = parse("PACING_LOW_WATER_FRACTION", &raw)?;
            if !(0.0..=1.0).contains(&fraction) {
                return Err(invalid("PACING_LOW_WATER_FRACTION", &raw, "must be within 0..=1"));
            }
            pacing = pacing.with_low_water_fraction(fraction);
        }
        if let Some(raw) = get("PACING_LOW_WATER_MIN") {
            pacing = pacing.with_low_water_min(parse("PACING_LOW_WATER_MIN", &raw)?);
        }

        let mut logger = LoggerConfig::default();
        if let Some(format) = get("LOG_FORMAT") {
            logger.format = LoggerFormat::from_str(&format)?;
        }
        if let Some(level) = get("LOG_LEVEL") {
            logger.level = level;
        }
        if let Some(file) = get("LOG_FILE") {
            logger = logger.with_file(PathBuf::from(file));
        }

        let ip: IpAddr = parse_or_str("BIND_ADDR", get("BIND_ADDR"), DEFAULT_BIND_ADDR)?;
        let port: u16 = parse_or("PORT", get("PORT"), DEFAULT_PORT)?;

        Ok(Self {
            hubspot,
            defaults,
            pacing,
            logger,
            bind: SocketAddr::new(ip, port),
        })
    }
}

fn invalid(key: &'static str, value: &str, reason: impl ToString) -> ConfigError {
    ConfigError::Invalid {
        key,
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

fn parse<T>(key: &'static str, raw: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.parse().map_err(|e| invalid(key, raw, e))
}

fn parse_or<T>(key: &'static str, raw: Option<String>, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.map_or(Ok(default), |raw| parse(key, &raw))
}

fn parse_or_str<T>(key: &'static str, raw: Option<String>, default: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    parse(key, raw.as_deref().unwrap_or(default))
}

fn parse_bool(key: &'static str, raw: Option<String>, default: bool) -> Result<bool, ConfigError> {
    let Some(raw) = raw else {
        return Ok(default);
    };
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(invalid(key, &raw, "expected true or false")),
    }
}
