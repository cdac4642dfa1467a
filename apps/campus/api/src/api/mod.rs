use axum::Router;

pub mod health;
pub mod rsvp;
pub mod tickets;

/// Creates the API routes without the `/api` prefix.
/// The `/api` prefix will be added by the `create_router` helper.
///
/// Returns a stateless Router (all sub-routers have state already applied).
pub fn routes(state: &crate::state::AppState) -> Router {
    Router::new()
        .nest("/rsvp", rsvp::router(state))
        .nest("/tickets", tickets::router(state))
}

/// `/ready`, checked against the database.
///
/// Has its state applied so it can be merged with the stateless app router
/// from `create_router`.
pub fn ready_router(state: crate::state::AppState) -> Router {
    use axum::routing::get;

    Router::new()
        .route("/ready", get(health::ready_handler))
        .with_state(state)
}
