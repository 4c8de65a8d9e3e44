//! API error types.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

use studycast_models::FailureKind;
use studycast_worker::WorkerError;

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error(transparent)]
    Worker(#[from] WorkerError),
}

impl ApiError {
    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::Unauthorized(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Worker(e) => match e {
                WorkerError::AlreadyInProgress(_) => StatusCode::CONFLICT,
                WorkerError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
                WorkerError::NotFound(_) => StatusCode::NOT_FOUND,
                // Only returned synchronously while the service is stopping
                WorkerError::Cancelled => StatusCode::SERVICE_UNAVAILABLE,
                WorkerError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
                e => match e.failure_kind() {
                    FailureKind::Retryable => StatusCode::SERVICE_UNAVAILABLE,
                    FailureKind::Unprocessable => StatusCode::UNPROCESSABLE_ENTITY,
                    FailureKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
                },
            },
        }
    }

    fn code(&self) -> &'static str {
        match self {
            ApiError::Unauthorized(_) => "unauthorized",
            ApiError::NotFound(_) => "not_found",
            ApiError::BadRequest(_) => "bad_request",
            ApiError::Internal(_) => "internal",
            ApiError::Worker(WorkerError::Cancelled) => "shutting_down",
            ApiError::Worker(e) => e.code(),
        }
    }

    fn retryable(&self) -> bool {
        match self {
            ApiError::Worker(WorkerError::Cancelled) => true,
            ApiError::Worker(e) => e.is_retryable(),
            _ => false,
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    detail: String,
    code: &'static str,
    retryable: bool,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // Don't expose internal error details in production
        let detail = if status == StatusCode::INTERNAL_SERVER_ERROR
            && std::env::var("ENVIRONMENT").unwrap_or_default() == "production"
        {
            "An internal error occurred".to_string()
        } else {
            self.to_string()
        };

        let body = ErrorResponse {
            detail,
            code: self.code(),
            retryable: self.retryable(),
        };

        (status, Json(body)).into_response()
    }
}
