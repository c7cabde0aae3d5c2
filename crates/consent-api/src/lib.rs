mod error;
pub use error::ApiError;

mod handler;
pub use handler::{ApiHandler, Health, KillAck, StateView};

mod adapter;
pub use adapter::ControllerApiAdapter;

#[cfg(feature = "http")]
mod http;

#[cfg(feature = "http")]
pub use http::HttpApi;

#[cfg(feature = "http")]
pub use axum;

#[cfg(test)]
mod testing;
