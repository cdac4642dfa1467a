use axum::response::{IntoResponse, Response};
use axum_helpers::AppError;
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

use crate::gateway::GatewayError;

#[derive(Debug, Error)]
pub enum TicketError {
    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Event not found: {0}")]
    EventNotFound(Uuid),

    #[error("Ticket not found")]
    TicketNotFound,

    #[error("Already registered with ticket {ticket_id}")]
    AlreadyRegistered { ticket_id: Uuid },

    #[error("Event {event_id} is at capacity")]
    CapacityExceeded { event_id: Uuid },

    #[error("Payment gateway is not configured")]
    GatewayUnconfigured,

    #[error("Unusable payment gateway response: {0}")]
    GatewayBadResponse(String),

    #[error("Payment gateway error: {0}")]
    Gateway(GatewayError),

    #[error("Payment {reference} not successful (status: {status})")]
    PaymentFailed { reference: String, status: String },

    #[error("Payment {reference} carries invalid metadata: {reason}")]
    BadMetadata { reference: String, reason: String },

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Invalid ticket state: {0}")]
    InvalidState(String),

    #[error("Event has not started")]
    EventNotStarted,

    #[error("Event has ended")]
    EventEnded,

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type TicketResult<T> = Result<T, TicketError>;

impl TicketError {
    /// The same call may succeed later: the gateway or datastore was
    /// unavailable, not the request itself.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            TicketError::Gateway(_)
                | TicketError::GatewayBadResponse(_)
                | TicketError::GatewayUnconfigured
                | TicketError::Internal(_)
        )
    }
}

impl From<GatewayError> for TicketError {
    fn from(err: GatewayError) -> Self {
        match err {
            GatewayError::BadResponse(details) => TicketError::GatewayBadResponse(details),
            other => TicketError::Gateway(other),
        }
    }
}

/// Gateway bodies and datastore messages stay in the logs; clients get a
/// fixed message.
impl From<TicketError> for AppError {
    fn from(err: TicketError) -> Self {
        match err {
            TicketError::Validation(msg) => AppError::BadRequest(msg),
            TicketError::EventNotFound(id) => AppError::NotFound(format!("Event {} not found", id)),
            TicketError::TicketNotFound => AppError::NotFound("Ticket not found".to_string()),
            TicketError::AlreadyRegistered { ticket_id } => AppError::conflict_with(
                "You are already registered for this event",
                json!({ "ticketId": ticket_id }),
            ),
            TicketError::CapacityExceeded { .. } => {
                AppError::BadRequest("Not enough spots left for this event".to_string())
            }
            TicketError::GatewayUnconfigured => {
                AppError::InternalServerError("payment gateway not configured".to_string())
            }
            TicketError::GatewayBadResponse(_) | TicketError::Gateway(_) => {
                AppError::BadGateway("Payment provider request failed".to_string())
            }
            TicketError::PaymentFailed { .. } => {
                AppError::BadRequest("Payment was not successful".to_string())
            }
            TicketError::BadMetadata { reference, .. } => AppError::BadRequest(format!(
                "Payment {} could not be matched to an RSVP; contact support",
                reference
            )),
            TicketError::Forbidden(msg) => AppError::Forbidden(msg),
            TicketError::InvalidState(msg) => AppError::BadRequest(msg),
            TicketError::EventNotStarted => {
                AppError::BadRequest("Check-in opens when the event starts".to_string())
            }
            TicketError::EventEnded => AppError::BadRequest("Event has ended".to_string()),
            TicketError::Internal(msg) => AppError::InternalServerError(msg),
        }
    }
}

impl IntoResponse for TicketError {
    fn into_response(self) -> Response {
        let app_error: AppError = self.into();
        app_error.into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    fn status_of(err: TicketError) -> StatusCode {
        AppError::from(err).status()
    }

    #[test]
    fn test_status_mapping() {
        let id = Uuid::new_v4();
        assert_eq!(status_of(TicketError::Validation("x".into())), StatusCode::BAD_REQUEST);
        assert_eq!(status_of(TicketError::EventNotFound(id)), StatusCode::NOT_FOUND);
        assert_eq!(status_of(TicketError::TicketNotFound), StatusCode::NOT_FOUND);
        assert_eq!(
            status_of(TicketError::AlreadyRegistered { ticket_id: id }),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_of(TicketError::CapacityExceeded { event_id: id }),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(TicketError::GatewayUnconfigured),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            status_of(TicketError::Gateway(GatewayError::Timeout)),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(status_of(TicketError::Forbidden("no".into())), StatusCode::FORBIDDEN);
        assert_eq!(status_of(TicketError::EventNotStarted), StatusCode::BAD_REQUEST);
        assert_eq!(status_of(TicketError::EventEnded), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_retryable_classes() {
        assert!(TicketError::Gateway(GatewayError::Timeout).is_retryable());
        assert!(TicketError::GatewayBadResponse("empty".into()).is_retryable());
        assert!(TicketError::Internal("db down".into()).is_retryable());

        assert!(!TicketError::EventNotFound(Uuid::new_v4()).is_retryable());
        assert!(!TicketError::Validation("x".into()).is_retryable());
        assert!(
            !TicketError::PaymentFailed {
                reference: "ref".into(),
                status: "failed".into()
            }
            .is_retryable()
        );
        assert!(
            !TicketError::BadMetadata {
                reference: "ref".into(),
                reason: "missing".into()
            }
            .is_retryable()
        );
    }

    #[test]
    fn test_bad_response_keeps_its_own_variant() {
        let err: TicketError = GatewayError::BadResponse("no reference".into()).into();
        assert!(matches!(err, TicketError::GatewayBadResponse(_)));

        let err: TicketError = GatewayError::Timeout.into();
        assert!(matches!(err, TicketError::Gateway(GatewayError::Timeout)));
    }

    #[test]
    fn test_conflict_carries_ticket_id() {
        let ticket_id = Uuid::new_v4();
        match AppError::from(TicketError::AlreadyRegistered { ticket_id }) {
            AppError::Conflict { details, .. } => {
                assert_eq!(details, Some(json!({ "ticketId": ticket_id })));
            }
            other => panic!("expected conflict, got {other:?}"),
        }
    }
}
