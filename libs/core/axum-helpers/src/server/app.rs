use super::shutdown::ShutdownCoordinator;
use crate::errors::handlers::{method_not_allowed, not_found};
use crate::http::{CorsConfig, create_cors_layer, security_headers};
use axum::{Router, middleware};
use core_config::server::ServerConfig;
use std::future::Future;
use std::io;
use tower_http::compression::CompressionLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::{Level, info, warn};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Wraps the API routes with documentation and the cross-cutting layers.
///
/// - `apis` is nested under `/api`; each domain router applies its own state
/// - Swagger UI at `/swagger-ui`, spec at `/api-docs/openapi.json`,
///   plus ReDoc (`/redoc`), RapiDoc (`/rapidoc`) and Scalar (`/scalar`)
/// - JSON 404 and 405 fallbacks
/// - request tracing, request timeout, security headers, CORS, compression
///
/// Health endpoints are merged in by the binary, outside `/api`.
pub fn create_router<T>(apis: Router, server: &ServerConfig, cors: &CorsConfig) -> Router
where
    T: OpenApi + 'static,
{
    use utoipa_rapidoc::RapiDoc;
    use utoipa_redoc::{Redoc, Servable as RedocServable};
    use utoipa_scalar::{Scalar, Servable as ScalarServable};

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", T::openapi()))
        .merge(Redoc::with_url("/redoc", T::openapi()))
        .merge(RapiDoc::new("/api-docs/openapi.json").path("/rapidoc"))
        .merge(Scalar::with_url("/scalar", T::openapi()))
        .nest("/api", apis)
        .fallback(not_found)
        .method_not_allowed_fallback(method_not_allowed)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(TimeoutLayer::new(server.request_timeout))
        .layer(middleware::from_fn(security_headers))
        .layer(create_cors_layer(cors))
        .layer(CompressionLayer::new())
}

/// Serves `router` until SIGINT/SIGTERM, drains in-flight requests, then runs
/// `cleanup` bounded by `server_config.shutdown_timeout`.
///
/// ```ignore
/// let cleanup = async move {
///     let _ = db.close().await;
/// };
/// create_production_app(router, &config.server, cleanup).await?;
/// ```
pub async fn create_production_app<F>(
    router: Router,
    server_config: &ServerConfig,
    cleanup: F,
) -> io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let coordinator = ShutdownCoordinator::new();

    let listener = tokio::net::TcpListener::bind(server_config.address()).await?;
    info!(address = %listener.local_addr()?, "Server listening");

    let signals = {
        let coordinator = coordinator.clone();
        tokio::spawn(async move { coordinator.listen_for_signals().await })
    };

    let graceful = {
        let coordinator = coordinator.clone();
        async move { coordinator.wait().await }
    };

    let serve_result = axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(graceful)
        .await
        .inspect_err(|e| tracing::error!(error = %e, "Server encountered an error"));

    signals.abort();

    let timeout = server_config.shutdown_timeout;
    info!(?timeout, "Running cleanup");
    match tokio::time::timeout(timeout, cleanup).await {
        Ok(()) => info!("Cleanup completed"),
        Err(_) => warn!(?timeout, "Cleanup exceeded timeout, exiting anyway"),
    }

    serve_result
}
