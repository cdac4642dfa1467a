use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{DeriveActiveEnum, EnumIter};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use strum::Display;
use thiserror::Error;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::error::{TicketError, TicketResult};

/// Largest number of places one RSVP may claim.
pub const MAX_QUANTITY: i32 = 10;

/// Ticket lifecycle. `confirmed → checked-in` is the only transition.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    Display,
    Default,
    DeriveActiveEnum,
    EnumIter,
    ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "ticket_status")]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum TicketStatus {
    #[default]
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "confirmed")]
    Confirmed,
    #[sea_orm(string_value = "checked-in")]
    CheckedIn,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Ticket {
    pub id: Uuid,
    pub user_id: Uuid,
    pub event_id: Uuid,
    pub quantity: i32,
    pub status: TicketStatus,
    pub payment_reference: Option<String>,
    /// Major currency units.
    #[schema(value_type = f64)]
    pub amount_paid: Decimal,
    pub email: String,
    /// The intent the ticket was issued for (`userId`, `eventId`, `quantity`).
    #[schema(value_type = Object)]
    pub metadata: Value,
    pub checked_in_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The part of an event that settlement and check-in read.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub id: Uuid,
    pub organizer_id: Uuid,
    pub title: String,
    pub registration_fee: Decimal,
    /// Legacy fee field; wins over `registration_fee` when positive.
    pub ticket_price: Option<Decimal>,
    /// `None` or `<= 0` means unlimited.
    pub capacity: Option<i32>,
    pub tickets_sold: i32,
    pub rsvp_count: i32,
    pub date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
}

impl Event {
    pub fn unit_price(&self) -> Decimal {
        match self.ticket_price {
            Some(price) if price > Decimal::ZERO => price,
            _ if self.registration_fee > Decimal::ZERO => self.registration_fee,
            _ => Decimal::ZERO,
        }
    }

    pub fn is_free(&self) -> bool {
        self.unit_price().is_zero()
    }

    pub fn capacity_limit(&self) -> Option<i32> {
        self.capacity.filter(|capacity| *capacity > 0)
    }

    pub fn has_room_for(&self, quantity: i32) -> bool {
        self.capacity_limit()
            .is_none_or(|capacity| {
                self.tickets_sold
                    .checked_add(quantity)
                    .is_some_and(|total| total <= capacity)
            })
    }
}

/// Read-only view of the attendee's profile.
#[derive(Debug, Clone, PartialEq)]
pub struct GuestProfile {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub avatar_url: Option<String>,
}

/// A ticket about to be written as `confirmed`.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTicket {
    pub user_id: Uuid,
    pub event_id: Uuid,
    pub quantity: i32,
    pub reference: String,
    pub amount_paid: Decimal,
    pub email: String,
    pub metadata: Value,
}

fn default_quantity() -> i32 {
    1
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct InitializeRsvp {
    pub user_id: Uuid,
    pub event_id: Uuid,
    #[validate(email(message = "email must be a valid address"))]
    pub email: String,
    #[serde(default = "default_quantity")]
    #[validate(range(min = 1, max = 10, message = "quantity must be between 1 and 10"))]
    #[schema(minimum = 1, maximum = 10, default = 1)]
    pub quantity: i32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RsvpOutcome {
    Free { ticket_id: Uuid },
    Paid {
        authorization_url: String,
        reference: String,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InitializeRsvpResponse {
    pub success: bool,
    pub is_free: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ticket_id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authorization_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
}

impl From<RsvpOutcome> for InitializeRsvpResponse {
    fn from(outcome: RsvpOutcome) -> Self {
        match outcome {
            RsvpOutcome::Free { ticket_id } => Self {
                success: true,
                is_free: true,
                ticket_id: Some(ticket_id),
                authorization_url: None,
                reference: None,
            },
            RsvpOutcome::Paid {
                authorization_url,
                reference,
            } => Self {
                success: true,
                is_free: false,
                ticket_id: None,
                authorization_url: Some(authorization_url),
                reference: Some(reference),
            },
        }
    }
}

#[derive(Debug, Clone, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct VerifyPaymentQuery {
    /// Gateway transaction reference from the payment callback.
    #[serde(default)]
    pub reference: String,
}

/// Result of settling a reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Settlement {
    pub ticket_id: Uuid,
    /// The attendee already held a ticket issued under another reference.
    pub already_registered: bool,
    /// This call wrote the ticket.
    pub created: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VerifyPaymentResponse {
    pub success: bool,
    pub ticket_id: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub already_registered: Option<bool>,
}

impl From<Settlement> for VerifyPaymentResponse {
    fn from(settlement: Settlement) -> Self {
        Self {
            success: true,
            ticket_id: settlement.ticket_id,
            already_registered: settlement.already_registered.then_some(true),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum IntentError {
    #[error("metadata is not a JSON object")]
    NotAnObject,

    #[error("metadata field '{0}' is missing")]
    Missing(&'static str),

    #[error("metadata field '{0}' is not a UUID")]
    NotUuid(&'static str),

    #[error("metadata quantity {0} exceeds the limit of {MAX_QUANTITY}")]
    QuantityOutOfRange(i64),
}

/// What the attendee asked for, carried through the gateway as metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RsvpIntent {
    pub user_id: Uuid,
    pub event_id: Uuid,
    pub quantity: i32,
}

impl RsvpIntent {
    pub fn to_metadata(&self) -> Value {
        json!({
            "userId": self.user_id,
            "eventId": self.event_id,
            "quantity": self.quantity,
        })
    }

    /// Reads the intent back from verified metadata.
    ///
    /// Accepts an object or a JSON-encoded object string. Quantity is read
    /// from `quantity`, then `qty`, as a number or numeric string; an absent
    /// or unusable value settles as 1, one above `MAX_QUANTITY` is rejected.
    pub fn from_metadata(metadata: &Value) -> Result<Self, IntentError> {
        let decoded;
        let metadata = match metadata {
            Value::String(raw) => {
                decoded = serde_json::from_str::<Value>(raw).map_err(|_| IntentError::NotAnObject)?;
                &decoded
            }
            other => other,
        };
        let object = metadata.as_object().ok_or(IntentError::NotAnObject)?;

        Ok(Self {
            user_id: uuid_field(object, "userId", "user_id")?,
            event_id: uuid_field(object, "eventId", "event_id")?,
            quantity: quantity_field(object)?,
        })
    }
}

fn uuid_field(
    object: &Map<String, Value>,
    key: &'static str,
    alias: &'static str,
) -> Result<Uuid, IntentError> {
    let value = object
        .get(key)
        .or_else(|| object.get(alias))
        .and_then(Value::as_str)
        .ok_or(IntentError::Missing(key))?;
    Uuid::parse_str(value.trim()).map_err(|_| IntentError::NotUuid(key))
}

fn quantity_field(object: &Map<String, Value>) -> Result<i32, IntentError> {
    let Some(raw) = object.get("quantity").or_else(|| object.get("qty")) else {
        return Ok(1);
    };

    let parsed = match raw {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    };

    match parsed {
        Some(n) if n > i64::from(MAX_QUANTITY) => Err(IntentError::QuantityOutOfRange(n)),
        Some(n) if n >= 1 => i32::try_from(n).map_err(|_| IntentError::QuantityOutOfRange(n)),
        _ => {
            tracing::warn!(quantity = %raw, "Unusable quantity in payment metadata, settling as 1");
            Ok(1)
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CheckInRequest {
    pub ticket_id: Option<Uuid>,
    pub user_id: Option<Uuid>,
    pub event_id: Option<Uuid>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckInTarget {
    Ticket(Uuid),
    Attendee { user_id: Uuid, event_id: Uuid },
}

impl CheckInRequest {
    /// `ticketId` wins when both forms are present.
    pub fn target(&self) -> TicketResult<CheckInTarget> {
        match (self.ticket_id, self.user_id, self.event_id) {
            (Some(ticket_id), _, _) => Ok(CheckInTarget::Ticket(ticket_id)),
            (None, Some(user_id), Some(event_id)) => {
                Ok(CheckInTarget::Attendee { user_id, event_id })
            }
            _ => Err(TicketError::Validation(
                "provide ticketId, or userId and eventId".to_string(),
            )),
        }
    }
}

/// What door staff see for a guest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GuestView {
    pub ticket_id: Uuid,
    pub name: String,
    pub email: String,
    pub avatar: Option<String>,
    pub status: TicketStatus,
    pub checked_in_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CheckInResponse {
    pub success: bool,
    pub guest: GuestView,
}
