//! JSON extractor that runs `validator` rules before the handler sees the body.

use crate::errors::AppError;
use axum::{
    extract::{FromRequest, Json, Request},
    response::{IntoResponse, Response},
};
use serde::de::DeserializeOwned;
use validator::Validate;

/// Deserializes the body as JSON and validates it.
///
/// Both a malformed body and failed validation rules produce the standard
/// 400 error body; validation failures list the offending fields in `details`.
///
/// ```ignore
/// #[derive(Deserialize, Validate)]
/// struct CheckIn {
///     #[validate(email)]
///     email: String,
/// }
///
/// async fn handler(ValidatedJson(payload): ValidatedJson<CheckIn>) {}
/// ```
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(data) = Json::<T>::from_request(req, state)
            .await
            .map_err(|e| AppError::from(e).into_response())?;

        data.validate()
            .map_err(|e| AppError::from(e).into_response())?;

        Ok(ValidatedJson(data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{Router, body::Body, http::StatusCode, routing::post};
    use http_body_util::BodyExt;
    use serde::Deserialize;
    use tower::ServiceExt;

    #[derive(Deserialize, Validate)]
    struct Signup {
        #[validate(email)]
        email: String,
        #[validate(range(min = 1, max = 10))]
        seats: u32,
    }

    fn app() -> Router {
        Router::new().route(
            "/",
            post(|ValidatedJson(body): ValidatedJson<Signup>| async move {
                format!("{}:{}", body.email, body.seats)
            }),
        )
    }

    async fn send(body: &str) -> (StatusCode, serde_json::Value) {
        let request = axum::http::Request::builder()
            .method("POST")
            .uri("/")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        let response = app().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
        (status, json)
    }

    #[tokio::test]
    async fn test_valid_body_reaches_handler() {
        let request = axum::http::Request::builder()
            .method("POST")
            .uri("/")
            .header("content-type", "application/json")
            .body(Body::from(r#"{"email":"ada@campus.edu","seats":2}"#))
            .unwrap();
        let response = app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&bytes[..], b"ada@campus.edu:2");
    }

    #[tokio::test]
    async fn test_failed_rules_are_reported_per_field() {
        let (status, json) = send(r#"{"email":"nope","seats":11}"#).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "VALIDATION_ERROR");
        assert!(json["details"].get("email").is_some());
        assert!(json["details"].get("seats").is_some());
    }

    #[tokio::test]
    async fn test_missing_field_is_bad_request() {
        let (status, json) = send(r#"{"email":"ada@campus.edu"}"#).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "JSON_EXTRACTION");
        assert_eq!(json["success"], false);
    }
}
