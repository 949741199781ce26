use axum::{http::StatusCode, response::{IntoResponse, Response}, Json};
use tracing::warn;

use crate::application::dto::ErrorResponse;
use crate::domain::errors::DomainError;

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub error_type: &'static str,
    pub message: String,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self { status: StatusCode::BAD_REQUEST, error_type: "invalid_request", message: message.into() }
    }
}

impl From<DomainError> for ApiError {
    fn from(e: DomainError) -> Self {
        let (status, error_type) = match &e {
            DomainError::InvalidInput(_) => (StatusCode::BAD_REQUEST, "invalid_request"),
            DomainError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            DomainError::ModelLoad(_) => (StatusCode::SERVICE_UNAVAILABLE, "model_unavailable"),
            DomainError::Inference(_) => (StatusCode::INTERNAL_SERVER_ERROR, "inference_failed"),
        };
        Self { status, error_type, message: e.to_string() }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            warn!("{} {}: {}", self.status.as_u16(), self.error_type, self.message);
        }
        let body = ErrorResponse { error_type: self.error_type.to_string(), message: self.message };
        (self.status, Json(body)).into_response()
    }
}
