pub mod codes;
pub mod handlers;
pub mod responses;

pub use codes::ErrorCode;

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use sea_orm::DbErr;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;
use uuid::Error as UuidError;
use validator::ValidationErrors;

/// Body of every error response.
///
/// ```json
/// {
///   "success": false,
///   "code": 1008,
///   "error": "CONFLICT",
///   "message": "You are already registered for this event",
///   "details": { "ticketId": "0192c0de-..." }
/// }
/// ```
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Always `false`; lets clients branch on one field for every response.
    pub success: bool,
    /// Integer error code for logging and monitoring
    pub code: i32,
    /// Machine-readable error identifier
    pub error: String,
    /// Human-readable message, safe to show to end users
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ErrorResponse {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            success: false,
            code: code.code(),
            error: code.as_str().to_string(),
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }
}

/// HTTP-facing error type. Domain crates convert their own errors into this.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppError {
    #[error("JSON parsing error: {0}")]
    SerdeJson(#[from] serde_json::Error),

    #[error("Database error: {0}")]
    Database(#[from] DbErr),

    #[error("JSON extraction error: {0}")]
    JsonExtractorRejection(#[from] JsonRejection),

    #[error("Validation error: {0}")]
    ValidationError(#[from] ValidationErrors),

    #[error("UUID error: {0}")]
    UuidError(#[from] UuidError),

    #[error("Bad Request: {0}")]
    BadRequest(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not Found: {0}")]
    NotFound(String),

    #[error("Conflict: {message}")]
    Conflict {
        message: String,
        details: Option<serde_json::Value>,
    },

    #[error("Unprocessable Entity: {0}")]
    UnprocessableEntity(String),

    #[error("Bad Gateway: {0}")]
    BadGateway(String),

    #[error("Internal Server Error: {0}")]
    InternalServerError(String),

    #[error("Service Unavailable: {0}")]
    ServiceUnavailable(String),
}

impl AppError {
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
            details: None,
        }
    }

    pub fn conflict_with(message: impl Into<String>, details: serde_json::Value) -> Self {
        Self::Conflict {
            message: message.into(),
            details: Some(details),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::SerdeJson(_) | AppError::InternalServerError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            AppError::Database(e) => map_db_error(e).0,
            AppError::JsonExtractorRejection(e) => json_rejection_status(e),
            AppError::ValidationError(_) | AppError::UuidError(_) | AppError::BadRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict { .. } => StatusCode::CONFLICT,
            AppError::UnprocessableEntity(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::BadGateway(_) => StatusCode::BAD_GATEWAY,
            AppError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match self {
            AppError::SerdeJson(e) => {
                tracing::error!(error_code = ErrorCode::SerdeJsonError.code(), error = ?e, "JSON serialization error");
                ErrorResponse::new(
                    ErrorCode::SerdeJsonError,
                    ErrorCode::SerdeJsonError.default_message(),
                )
            }
            AppError::Database(e) => {
                let (_, code) = map_db_error(&e);
                tracing::error!(error_code = code.code(), error = %e, "Database error");
                ErrorResponse::new(code, code.default_message())
            }
            AppError::JsonExtractorRejection(e) => {
                tracing::debug!(error_code = ErrorCode::JsonExtraction.code(), error = %e, "JSON extraction error");
                ErrorResponse::new(ErrorCode::JsonExtraction, e.body_text())
            }
            AppError::ValidationError(e) => {
                tracing::debug!(error_code = ErrorCode::ValidationError.code(), errors = ?e, "Validation error");
                let details = serde_json::to_value(&e).unwrap_or(serde_json::Value::Null);
                ErrorResponse::new(
                    ErrorCode::ValidationError,
                    ErrorCode::ValidationError.default_message(),
                )
                .with_details(details)
            }
            AppError::UuidError(e) => {
                tracing::debug!(error = %e, "UUID error");
                ErrorResponse::new(ErrorCode::InvalidUuid, ErrorCode::InvalidUuid.default_message())
            }
            AppError::BadRequest(msg) => {
                tracing::info!(message = %msg, "Bad request");
                ErrorResponse::new(ErrorCode::BadRequest, msg)
            }
            AppError::Unauthorized(msg) => {
                tracing::info!(message = %msg, "Unauthorized");
                ErrorResponse::new(ErrorCode::Unauthorized, msg)
            }
            AppError::Forbidden(msg) => {
                tracing::info!(message = %msg, "Forbidden");
                ErrorResponse::new(ErrorCode::Forbidden, msg)
            }
            AppError::NotFound(msg) => {
                tracing::info!(message = %msg, "Not found");
                ErrorResponse::new(ErrorCode::NotFound, msg)
            }
            AppError::Conflict { message, details } => {
                tracing::info!(message = %message, "Conflict");
                let body = ErrorResponse::new(ErrorCode::Conflict, message);
                match details {
                    Some(details) => body.with_details(details),
                    None => body,
                }
            }
            AppError::UnprocessableEntity(msg) => {
                tracing::info!(message = %msg, "Unprocessable entity");
                ErrorResponse::new(ErrorCode::UnprocessableEntity, msg)
            }
            AppError::BadGateway(msg) => {
                tracing::warn!(error_code = ErrorCode::BadGateway.code(), message = %msg, "Bad gateway");
                ErrorResponse::new(ErrorCode::BadGateway, msg)
            }
            AppError::InternalServerError(msg) => {
                tracing::error!(error_code = ErrorCode::InternalError.code(), message = %msg, "Internal server error");
                // Internal details stay in the logs.
                ErrorResponse::new(
                    ErrorCode::InternalError,
                    ErrorCode::InternalError.default_message(),
                )
            }
            AppError::ServiceUnavailable(msg) => {
                tracing::warn!(message = %msg, "Service unavailable");
                ErrorResponse::new(ErrorCode::ServiceUnavailable, msg)
            }
        };

        (status, Json(body)).into_response()
    }
}

/// Pool exhaustion and dropped connections are transient (503); everything
/// else is a server fault (500).
fn map_db_error(error: &DbErr) -> (StatusCode, ErrorCode) {
    match error {
        DbErr::ConnectionAcquire(_) | DbErr::Conn(_) => {
            (StatusCode::SERVICE_UNAVAILABLE, ErrorCode::DatabaseUnavailable)
        }
        DbErr::RecordNotFound(_) => (StatusCode::NOT_FOUND, ErrorCode::DatabaseNotFound),
        _ => (StatusCode::INTERNAL_SERVER_ERROR, ErrorCode::DatabaseError),
    }
}

/// Malformed bodies are 400 regardless of which stage of extraction failed;
/// only a wrong content type keeps its own status.
fn json_rejection_status(rejection: &JsonRejection) -> StatusCode {
    match rejection {
        JsonRejection::MissingJsonContentType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
        _ => StatusCode::BAD_REQUEST,
    }
}
