use super::jwt::{JwtAuth, JwtClaims};
use crate::errors::AppError;
use axum::{
    extract::{FromRequestParts, Request, State},
    http::{HeaderMap, header, request::Parts},
    middleware::Next,
    response::{IntoResponse, Response},
};
use uuid::Uuid;

/// Bearer header first, then the `access_token` cookie.
fn extract_token_from_request(headers: &HeaderMap) -> Option<String> {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|auth| auth.strip_prefix("Bearer "))
        .map(|token| token.trim().to_string());

    bearer.or_else(|| {
        headers
            .get(header::COOKIE)
            .and_then(|v| v.to_str().ok())
            .and_then(|cookies| {
                cookies.split(';').find_map(|cookie| {
                    let (name, value) = cookie.trim().split_once('=')?;
                    (name == "access_token").then(|| value.to_string())
                })
            })
    })
}

/// Rejects requests without a valid token; otherwise stores [`JwtClaims`]
/// in the request extensions for [`AuthUser`].
///
/// ```ignore
/// let protected = Router::new()
///     .route("/check-in", post(check_in))
///     .layer(axum::middleware::from_fn_with_state(jwt_auth, jwt_auth_middleware));
/// ```
pub async fn jwt_auth_middleware(
    State(auth): State<JwtAuth>,
    mut request: Request,
    next: Next,
) -> Response {
    let Some(token) = extract_token_from_request(request.headers()) else {
        tracing::debug!("No JWT found in Authorization header or cookie");
        return AppError::Unauthorized("No token provided".to_string()).into_response();
    };

    match auth.verify_token(&token) {
        Ok(claims) => {
            request.extensions_mut().insert(claims);
            next.run(request).await
        }
        Err(e) => {
            tracing::debug!(error = %e, "JWT verification failed");
            AppError::Unauthorized("Invalid or expired token".to_string()).into_response()
        }
    }
}

/// The authenticated caller. Requires [`jwt_auth_middleware`] on the route.
#[derive(Debug, Clone)]
pub struct AuthUser(pub JwtClaims);

impl AuthUser {
    /// The caller's id; a non-UUID subject cannot own campus resources.
    pub fn user_id(&self) -> Result<Uuid, AppError> {
        self.0
            .user_id()
            .ok_or_else(|| AppError::Unauthorized("Token subject is not a user id".to_string()))
    }
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<JwtClaims>()
            .cloned()
            .map(AuthUser)
            .ok_or_else(|| AppError::Unauthorized("Authentication required".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::JwtConfig;
    use axum::{
        Router,
        body::Body,
        http::{Request as HttpRequest, StatusCode},
        middleware,
        routing::get,
    };
    use tower::ServiceExt;

    fn jwt() -> JwtAuth {
        JwtAuth::new(&JwtConfig::new("middleware-secret-middleware-secret-1").unwrap())
    }

    fn app(auth: JwtAuth) -> Router {
        Router::new()
            .route(
                "/me",
                get(|user: AuthUser| async move { user.0.sub }),
            )
            .layer(middleware::from_fn_with_state(auth, jwt_auth_middleware))
    }

    #[test]
    fn test_extract_token_prefers_bearer() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, "Bearer abc".parse().unwrap());
        headers.insert(header::COOKIE, "access_token=def".parse().unwrap());
        assert_eq!(extract_token_from_request(&headers).as_deref(), Some("abc"));
    }

    #[test]
    fn test_extract_token_from_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, "theme=dark; access_token=def".parse().unwrap());
        assert_eq!(extract_token_from_request(&headers).as_deref(), Some("def"));
    }

    #[tokio::test]
    async fn test_missing_token_is_unauthorized() {
        let response = app(jwt())
            .oneshot(HttpRequest::get("/me").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_valid_token_reaches_handler() {
        let auth = jwt();
        let token = auth
            .create_access_token("user-1", "u@campus.edu", "U", &[])
            .unwrap();
        let response = app(auth)
            .oneshot(
                HttpRequest::get("/me")
                    .header("authorization", format!("Bearer {token}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_garbage_token_is_unauthorized() {
        let response = app(jwt())
            .oneshot(
                HttpRequest::get("/me")
                    .header("authorization", "Bearer not.a.jwt")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
