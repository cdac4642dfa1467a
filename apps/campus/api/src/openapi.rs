use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

/// Registers the `bearer_auth` scheme the ticket endpoints reference.
struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    components(
        schemas(axum_helpers::ErrorResponse)
    ),
    info(
        title = "Campus Events API",
        version = "0.1.0",
        description = "RSVPs, payment settlement and door check-in for campus events"
    ),
    servers(
        (url = "/api", description = "API base path")
    ),
    nest(
        (path = "/rsvp", api = domain_tickets::RsvpApiDoc),
        (path = "/tickets", api = domain_tickets::TicketsApiDoc)
    ),
    modifiers(&BearerAuth)
)]
pub struct ApiDoc;
