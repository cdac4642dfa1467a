use axum::Router;
use domain_tickets::{CheckInService, PgTicketRepository, handlers};
use std::sync::Arc;

pub fn router(state: &crate::state::AppState) -> Router {
    let repository = Arc::new(PgTicketRepository::new(state.db.clone()));
    handlers::tickets_router(CheckInService::new(repository), state.jwt_auth.clone())
}
