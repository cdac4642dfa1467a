//! UUID path parameter extractor.

use crate::errors::{AppError, ErrorCode, ErrorResponse};
use axum::{
    Json,
    extract::{FromRequestParts, Path},
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Response},
};
use uuid::Uuid;

/// Parses a single `{id}` path segment as a UUID; anything else is a 400
/// with the standard error body.
///
/// ```ignore
/// async fn get_ticket(UuidPath(id): UuidPath) -> String {
///     format!("ticket {id}")
/// }
/// ```
pub struct UuidPath(pub Uuid);

impl<S> FromRequestParts<S> for UuidPath
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(raw) = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(|e| {
                let body = ErrorResponse::new(ErrorCode::InvalidUuid, e.body_text());
                (StatusCode::BAD_REQUEST, Json(body)).into_response()
            })?;

        Uuid::parse_str(&raw)
            .map(UuidPath)
            .map_err(|e| AppError::UuidError(e).into_response())
    }
}
