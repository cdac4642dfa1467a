//! Bearer-token authentication for routes that act on behalf of a user.
//!
//! Tokens are issued by the campus identity service; this crate only verifies
//! them against the shared `JWT_SECRET`.
//!
//! ```ignore
//! use axum_helpers::auth::{AuthUser, JwtAuth, JwtConfig, jwt_auth_middleware};
//!
//! let auth = JwtAuth::new(&JwtConfig::from_env()?);
//! let protected = Router::new()
//!     .route("/tickets/{id}", get(|user: AuthUser| async move { user.0.sub }))
//!     .layer(axum::middleware::from_fn_with_state(auth, jwt_auth_middleware));
//! ```

pub mod config;
pub mod jwt;
pub mod middleware;

pub use config::JwtConfig;
pub use jwt::{ACCESS_TOKEN_TTL, JwtAuth, JwtClaims};
pub use middleware::{AuthUser, jwt_auth_middleware};
