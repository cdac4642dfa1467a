use axum::{
    Json, Router,
    body::Bytes,
    extract::{Query, State},
    http::HeaderMap,
    middleware,
    routing::{get, post},
};
use axum_helpers::{
    AppError, AuditEvent, AuditOutcome, AuthUser, JwtAuth, UuidPath, ValidatedJson,
    errors::responses::{
        BadGatewayResponse, BadRequestResponse, BadRequestUuidResponse,
        BadRequestValidationResponse, ConflictResponse, ForbiddenResponse,
        InternalServerErrorResponse, NotFoundResponse, UnauthorizedResponse,
    },
    jwt_auth_middleware,
};
use serde::Deserialize;
use serde_json::{Value, json};
use std::sync::Arc;
use utoipa::OpenApi;

use crate::checkin::CheckInService;
use crate::error::{TicketError, TicketResult};
use crate::gateway::{SIGNATURE_HEADER, verify_webhook_signature};
use crate::models::{
    CheckInRequest, CheckInResponse, GuestView, InitializeRsvp, InitializeRsvpResponse, Ticket,
    TicketStatus, VerifyPaymentQuery, VerifyPaymentResponse,
};
use crate::repository::TicketRepository;
use crate::service::SettlementService;

pub const RSVP_TAG: &str = "rsvp";
pub const TICKETS_TAG: &str = "tickets";

/// OpenAPI documentation for the RSVP endpoints
#[derive(OpenApi)]
#[openapi(
    paths(initialize_rsvp, verify_payment, payment_webhook),
    components(
        schemas(InitializeRsvp, InitializeRsvpResponse, VerifyPaymentResponse),
        responses(
            BadRequestResponse,
            BadRequestValidationResponse,
            NotFoundResponse,
            ConflictResponse,
            UnauthorizedResponse,
            BadGatewayResponse,
            InternalServerErrorResponse
        )
    ),
    tags(
        (name = RSVP_TAG, description = "RSVP and payment settlement")
    )
)]
pub struct RsvpApiDoc;

/// OpenAPI documentation for the ticket endpoints
#[derive(OpenApi)]
#[openapi(
    paths(check_in, get_ticket),
    components(
        schemas(Ticket, TicketStatus, CheckInRequest, CheckInResponse, GuestView),
        responses(
            BadRequestResponse,
            BadRequestUuidResponse,
            UnauthorizedResponse,
            ForbiddenResponse,
            NotFoundResponse,
            InternalServerErrorResponse
        )
    ),
    tags(
        (name = TICKETS_TAG, description = "Ticket lookup and door check-in")
    )
)]
pub struct TicketsApiDoc;

pub struct RsvpState<R: TicketRepository> {
    service: Arc<SettlementService<R>>,
    /// Gateway secret; webhooks are refused without it.
    webhook_secret: Option<Arc<str>>,
}

impl<R: TicketRepository> Clone for RsvpState<R> {
    fn clone(&self) -> Self {
        Self {
            service: Arc::clone(&self.service),
            webhook_secret: self.webhook_secret.clone(),
        }
    }
}

/// `/initialize`, `/verify` and the gateway `/webhook`.
pub fn rsvp_router<R: TicketRepository + 'static>(
    service: SettlementService<R>,
    webhook_secret: Option<String>,
) -> Router {
    let state = RsvpState {
        service: Arc::new(service),
        webhook_secret: webhook_secret.map(Arc::from),
    };

    Router::new()
        .route("/initialize", post(initialize_rsvp))
        .route("/verify", get(verify_payment))
        .route("/webhook", post(payment_webhook))
        .with_state(state)
}

/// `/check-in` and `/{id}`; every route requires a bearer token.
pub fn tickets_router<R: TicketRepository + 'static>(
    service: CheckInService<R>,
    auth: JwtAuth,
) -> Router {
    Router::new()
        .route("/check-in", post(check_in))
        .route("/{id}", get(get_ticket))
        .layer(middleware::from_fn_with_state(auth, jwt_auth_middleware))
        .with_state(Arc::new(service))
}

/// Start an RSVP
///
/// Free events are confirmed immediately. Paid events return a checkout URL;
/// the ticket is issued once the payment is verified.
#[utoipa::path(
    post,
    path = "/initialize",
    tag = RSVP_TAG,
    request_body = InitializeRsvp,
    responses(
        (status = 200, description = "RSVP confirmed or checkout started", body = InitializeRsvpResponse),
        (status = 400, response = BadRequestValidationResponse),
        (status = 404, response = NotFoundResponse),
        (status = 409, response = ConflictResponse),
        (status = 502, response = BadGatewayResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn initialize_rsvp<R: TicketRepository>(
    State(state): State<RsvpState<R>>,
    ValidatedJson(input): ValidatedJson<InitializeRsvp>,
) -> TicketResult<Json<InitializeRsvpResponse>> {
    let outcome = state.service.initialize_rsvp(input).await?;
    Ok(Json(outcome.into()))
}

/// Settle a payment reference
///
/// Safe to call repeatedly; every call for a settled reference returns the
/// same ticket id.
#[utoipa::path(
    get,
    path = "/verify",
    tag = RSVP_TAG,
    params(VerifyPaymentQuery),
    responses(
        (status = 200, description = "Payment settled", body = VerifyPaymentResponse),
        (status = 400, response = BadRequestResponse),
        (status = 404, response = NotFoundResponse),
        (status = 502, response = BadGatewayResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn verify_payment<R: TicketRepository>(
    State(state): State<RsvpState<R>>,
    Query(query): Query<VerifyPaymentQuery>,
) -> TicketResult<Json<VerifyPaymentResponse>> {
    let settlement = state.service.verify_payment(&query.reference).await?;
    Ok(Json(settlement.into()))
}

#[derive(Debug, Deserialize)]
struct WebhookEvent {
    event: String,
    #[serde(default)]
    data: Value,
}

/// Gateway event callback
///
/// Requires a valid `x-paystack-signature`. `charge.success` settles the
/// reference; other events are acknowledged and ignored. Gateway or datastore
/// outages answer 5xx so the event is re-delivered.
#[utoipa::path(
    post,
    path = "/webhook",
    tag = RSVP_TAG,
    request_body(content = Object, description = "Gateway event"),
    params(
        ("x-paystack-signature" = String, Header, description = "Hex HMAC-SHA512 of the raw body")
    ),
    responses(
        (status = 200, description = "Event acknowledged"),
        (status = 400, response = BadRequestResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 500, response = InternalServerErrorResponse),
        (status = 502, response = BadGatewayResponse)
    )
)]
async fn payment_webhook<R: TicketRepository>(
    State(state): State<RsvpState<R>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Value>, AppError> {
    let Some(secret) = state.webhook_secret.as_deref() else {
        return Err(TicketError::GatewayUnconfigured.into());
    };

    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    if !verify_webhook_signature(secret, &body, signature) {
        tracing::warn!("Rejected webhook with invalid signature");
        return Err(AppError::Unauthorized("Invalid signature".to_string()));
    }

    let event: WebhookEvent = serde_json::from_slice(&body)
        .map_err(|e| AppError::BadRequest(format!("Invalid webhook payload: {}", e)))?;

    if event.event != "charge.success" {
        tracing::debug!(event = %event.event, "Ignoring webhook event");
        return Ok(Json(json!({ "success": true })));
    }

    let reference = event
        .data
        .get("reference")
        .and_then(Value::as_str)
        .unwrap_or_default();

    // Terminal failures are ours to reconcile; transient ones go back to the
    // gateway as 5xx so it re-delivers.
    match state.service.verify_payment(reference).await {
        Ok(settlement) => tracing::info!(
            reference,
            ticket_id = %settlement.ticket_id,
            created = settlement.created,
            "Webhook settled payment"
        ),
        Err(e) if e.is_retryable() => {
            tracing::warn!(reference, error = %e, "Webhook settlement failed, awaiting redelivery");
            return Err(e.into());
        }
        Err(e) => tracing::error!(reference, error = %e, "Webhook settlement failed"),
    }

    Ok(Json(json!({ "success": true })))
}

/// Check a guest in
///
/// Organizer only. Identify the ticket by `ticketId`, or by `userId` and `eventId`.
#[utoipa::path(
    post,
    path = "/check-in",
    tag = TICKETS_TAG,
    request_body = CheckInRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Guest checked in", body = CheckInResponse),
        (status = 400, response = BadRequestResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 403, response = ForbiddenResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn check_in<R: TicketRepository>(
    State(service): State<Arc<CheckInService<R>>>,
    user: AuthUser,
    headers: HeaderMap,
    ValidatedJson(request): ValidatedJson<CheckInRequest>,
) -> Result<Json<CheckInResponse>, AppError> {
    let caller_id = user.user_id()?;
    let target = request.target()?;

    match service.check_in(caller_id, target).await {
        Ok(guest) => {
            AuditEvent::new("ticket.check_in", AuditOutcome::Success)
                .actor(caller_id)
                .resource("ticket", guest.ticket_id)
                .from_headers(&headers)
                .log();
            Ok(Json(CheckInResponse {
                success: true,
                guest,
            }))
        }
        Err(e @ TicketError::Forbidden(_)) => {
            AuditEvent::new("ticket.check_in", AuditOutcome::Denied)
                .actor(caller_id)
                .from_headers(&headers)
                .with_details(json!({ "target": format!("{:?}", target) }))
                .log();
            Err(e.into())
        }
        Err(e) => Err(e.into()),
    }
}

/// Get a ticket
///
/// Readable by the ticket holder and the event organizer.
#[utoipa::path(
    get,
    path = "/{id}",
    tag = TICKETS_TAG,
    params(
        ("id" = Uuid, Path, description = "Ticket ID")
    ),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Ticket found", body = Ticket),
        (status = 400, response = BadRequestUuidResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 403, response = ForbiddenResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn get_ticket<R: TicketRepository>(
    State(service): State<Arc<CheckInService<R>>>,
    user: AuthUser,
    UuidPath(id): UuidPath,
) -> Result<Json<Ticket>, AppError> {
    let ticket = service.get_ticket(user.user_id()?, id).await?;
    Ok(Json(ticket))
}
