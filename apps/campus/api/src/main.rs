use axum_helpers::server::{create_production_app, create_router, health_router};
use core_config::tracing::{init_tracing, install_color_eyre};
use domain_tickets::{PaymentGateway, PaystackGateway, TicketNotifier};
use email::TemplateEngine;
use std::sync::Arc;
use tracing::info;

mod api;
mod config;
mod openapi;
mod state;

use config::Config;
use state::AppState;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    // Install color-eyre first for colored error output (before any fallible operations)
    install_color_eyre();

    let config = Config::from_env()?;

    // Initialize tracing with ErrorLayer for span trace capture
    init_tracing(&config.environment);

    let db = database::postgres::connect_from_config_with_retry(config.database.clone(), None)
        .await
        .map_err(|e| eyre::eyre!("PostgreSQL connection failed: {}", e))?;

    if config.run_migrations {
        database::postgres::run_migrations::<migration::Migrator>(&db, config.app.name)
            .await
            .map_err(|e| eyre::eyre!("Migrations failed: {}", e))?;
    }

    let gateway = PaystackGateway::from_config(&config.payments)
        .map_err(|e| eyre::eyre!("Payment gateway setup failed: {}", e))?
        .map(|g| Arc::new(g) as Arc<dyn PaymentGateway>);
    if gateway.is_none() {
        tracing::warn!("PAYSTACK_SECRET_KEY not set; paid RSVPs and webhooks are disabled");
    }

    let email_provider = email::build_provider(&config.email)?;
    info!(provider = email_provider.name(), "Email provider ready");
    let notifier = TicketNotifier::new(
        email_provider,
        TemplateEngine::new()?,
        config.app_name.clone(),
    );

    let jwt_auth = axum_helpers::JwtAuth::new(&config.jwt);

    let state = AppState {
        config,
        db,
        gateway,
        notifier,
        jwt_auth,
    };

    let api_routes = api::routes(&state);

    // create_router adds docs/middleware to our composed routes
    let router =
        create_router::<openapi::ApiDoc>(api_routes, &state.config.server, &state.config.cors);

    // - /health: liveness check with app name/version
    // - /ready: readiness check against the database
    let app = router
        .merge(health_router(state.config.app))
        .merge(api::ready_router(state.clone()));

    info!(environment = ?state.config.environment, "Starting campus API");

    let server = state.config.server.clone();
    create_production_app(app, &server, async move {
        info!("Shutting down: closing database connections");
        match state.db.close().await {
            Ok(_) => info!("PostgreSQL connection closed successfully"),
            Err(e) => tracing::error!("Error closing PostgreSQL: {}", e),
        }
    })
    .await
    .map_err(|e| eyre::eyre!("Server error: {}", e))?;

    info!("Campus API shutdown complete");
    Ok(())
}
