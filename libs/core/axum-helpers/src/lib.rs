//! # Axum Helpers
//!
//! Shared building blocks for the HTTP services in this workspace.
//!
//! - **[`errors`]**: `AppError` and the JSON error body every endpoint returns
//! - **[`extractors`]**: `UuidPath`, `ValidatedJson`
//! - **[`auth`]**: bearer-token verification and the `AuthUser` extractor
//! - **[`http`]**: CORS and security headers
//! - **[`server`]**: router assembly with OpenAPI docs, health probes, graceful shutdown
//! - **[`audit`]**: audit trail events

pub mod audit;
pub mod auth;
pub mod errors;
pub mod extractors;
pub mod http;
pub mod server;

pub use auth::{AuthUser, JwtAuth, JwtClaims, JwtConfig, jwt_auth_middleware};

pub use server::{
    HealthCheckFuture, HealthResponse, ShutdownCoordinator, create_production_app, create_router,
    health_router, run_health_checks, shutdown_signal,
};

pub use http::{CorsConfig, create_cors_layer, security_headers};

pub use errors::{AppError, ErrorCode, ErrorResponse};

pub use extractors::{UuidPath, ValidatedJson};

pub use audit::{AuditEvent, AuditOutcome, extract_ip_from_headers, extract_user_agent};
