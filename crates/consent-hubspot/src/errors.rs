use thiserror::Error;

#[derive(Error, Debug)]
pub enum HubSpotError {
    #[error("failed to build http client: {0}")]
    Client(#[from] reqwest::Error),

    #[error("invalid base url '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    #[error("missing access token")]
    MissingToken,
}
