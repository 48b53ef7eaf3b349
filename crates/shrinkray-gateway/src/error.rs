use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use shrinkray_core::{CodecError, ShortenerError};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("invalid url: {0}")]
    InvalidUrl(String),
    #[error("invalid short code: {0}")]
    InvalidCode(String),
    #[error("short code not found: {0}")]
    NotFound(String),
    #[error(transparent)]
    Shortener(#[from] ShortenerError),
}

impl From<CodecError> for AppError {
    fn from(error: CodecError) -> Self {
        match error {
            CodecError::InvalidCode(message) => AppError::InvalidCode(message),
            other => AppError::Shortener(other.into()),
        }
    }
}

impl AppError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::InvalidUrl(_) => (StatusCode::BAD_REQUEST, "INVALID_URL"),
            AppError::InvalidCode(_) => (StatusCode::BAD_REQUEST, "INVALID_CODE"),
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            AppError::Shortener(ShortenerError::InvalidArgument(_)) => {
                (StatusCode::BAD_REQUEST, "INVALID_ARGUMENT")
            }
            AppError::Shortener(ShortenerError::InvalidCode(_)) => {
                (StatusCode::BAD_REQUEST, "INVALID_CODE")
            }
            AppError::Shortener(e) if e.is_retryable() => {
                (StatusCode::SERVICE_UNAVAILABLE, "STORE_UNAVAILABLE")
            }
            AppError::Shortener(ShortenerError::IncompleteRecord { .. }) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "INCOMPLETE_RECORD")
            }
            AppError::Shortener(_) => (StatusCode::INTERNAL_SERVER_ERROR, "STORAGE_ERROR"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        let message = if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
            // Storage details stay in the logs.
            match status {
                StatusCode::SERVICE_UNAVAILABLE => "store temporarily unavailable, retry later",
                _ => "internal error",
            }
            .to_string()
        } else {
            self.to_string()
        };

        let body = json!({
            "error": code,
            "message": message,
        });

        (status, Json(body)).into_response()
    }
}
