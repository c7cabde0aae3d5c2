use consent_core::RunError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("a run is already in progress")]
    AlreadyRunning,

    #[error("not found: {0}")]
    NotFound(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<RunError> for ApiError {
    fn from(err: RunError) -> Self {
        match err {
            RunError::AlreadyRunning => ApiError::AlreadyRunning,
            RunError::InvalidRequest(e) => ApiError::InvalidRequest(e.to_string()),
        }
    }
}

#[cfg(feature = "http")]
mod response {
    use axum::{
        Json,
        http::StatusCode,
        response::{IntoResponse, Response},
    };
    use serde::Serialize;

    use super::ApiError;

    #[derive(Debug, Serialize)]
    struct ErrorBody {
        error: String,
    }

    impl ApiError {
        pub fn status_code(&self) -> StatusCode {
            match self {
                ApiError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
                ApiError::AlreadyRunning => StatusCode::CONFLICT,
                ApiError::NotFound(_) => StatusCode::NOT_FOUND,
                ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            }
        }
    }

    impl IntoResponse for ApiError {
        fn into_response(self) -> Response {
            let code = self.status_code();
            if code.is_server_error() {
                tracing::error!(error = %self, "request failed");
            }
            let body = ErrorBody {
                error: self.to_string(),
            };
            (code, Json(body)).into_response()
        }
    }
}
