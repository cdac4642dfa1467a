//! Application state management.
//!
//! Built once in `main` and handed to the route builders, which construct the
//! domain services they need from it.

use axum_helpers::JwtAuth;
use domain_tickets::{PaymentGateway, TicketNotifier};
use std::sync::Arc;

/// Shared application state. Every field is cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub config: crate::config::Config,
    /// PostgreSQL connection pool
    pub db: database::postgres::DatabaseConnection,
    /// `None` when no gateway secret is configured; paid RSVPs then fail fast.
    pub gateway: Option<Arc<dyn PaymentGateway>>,
    pub notifier: TicketNotifier,
    pub jwt_auth: JwtAuth,
}
