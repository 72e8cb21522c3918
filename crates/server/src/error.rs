//! HTTP error responses

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use style_lib::predictor::InferenceError;
use style_lib::store::StoreError;
use style_lib::ValidationErrors;
use tracing::error;

/// Failures surfaced by the HTTP handlers
#[derive(Debug)]
pub enum ApiError {
    /// Request body failed record validation (422)
    Validation(ValidationErrors),
    /// Encoding or classification failed (500, details only in logs)
    Inference(InferenceError),
    /// Lookup found no record (404)
    NotFound,
    /// Store failed on a lookup route (500)
    Store(StoreError),
    /// Lookup routes need a store (503)
    PersistenceDisabled,
}

impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        ApiError::Validation(errors)
    }
}

impl From<InferenceError> for ApiError {
    fn from(err: InferenceError) -> Self {
        ApiError::Inference(err)
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        ApiError::Store(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Validation(errors) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(json!({
                    "error": "Validation Error",
                    "message": "The provided data does not match the expected format",
                    "details": errors.errors,
                })),
            )
                .into_response(),
            ApiError::Inference(err) => {
                error!(error = %err, "Prediction failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "detail": "Prediction error" })),
                )
                    .into_response()
            }
            ApiError::NotFound => (
                StatusCode::NOT_FOUND,
                Json(json!({ "detail": "Prediction not found" })),
            )
                .into_response(),
            ApiError::Store(err) => {
                error!(error = %err, "Prediction store lookup failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "detail": "Database error" })),
                )
                    .into_response()
            }
            ApiError::PersistenceDisabled => (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "detail": "Prediction persistence is disabled" })),
            )
                .into_response(),
        }
    }
}
