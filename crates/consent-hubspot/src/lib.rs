mod client;
pub use client::HubSpotClient;

mod config;
pub use config::{DEFAULT_BASE_URL, HubSpotConfig};

mod errors;
pub use errors::HubSpotError;

mod ratelimit;
pub use ratelimit::parse_signal;

mod wire;
