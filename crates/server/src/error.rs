use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;
use tracing::error;

use localscope_core::errors::ValidationError;

/// Error surface of the HTTP API. Only validation failures and unrecoverable
/// internal errors ever reach the caller; everything else degrades inside
/// the pipeline before an `ApiError` is built.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),
    #[error("storage unavailable: {0}")]
    Unavailable(String),
    #[error("internal error: {0}")]
    Internal(String),
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::Validation(validation) => (StatusCode::BAD_REQUEST, validation.to_string()),
            ApiError::Unavailable(detail) => {
                error!(
                    event_name = "api.error.unavailable",
                    detail = %detail,
                    "storage unavailable"
                );
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "The service is temporarily unavailable. Please retry shortly.".to_string(),
                )
            }
            ApiError::Internal(detail) => {
                error!(event_name = "api.error.internal", detail = %detail, "internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An unexpected internal error occurred.".to_string(),
                )
            }
        };

        (status, Json(ErrorBody { error: message })).into_response()
    }
}
