use axum::Router;
use domain_tickets::{PgTicketRepository, SettlementService, handlers};
use std::sync::Arc;

pub fn router(state: &crate::state::AppState) -> Router {
    let repository = Arc::new(PgTicketRepository::new(state.db.clone()));
    let service = SettlementService::new(
        repository,
        state.gateway.clone(),
        state.notifier.clone(),
        state.config.frontend_url.clone(),
    );
    // The gateway signs webhooks with the same secret it authenticates us with.
    handlers::rsvp_router(service, state.config.payments.secret_key.clone())
}
