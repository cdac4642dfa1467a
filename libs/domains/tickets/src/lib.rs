//! Tickets Domain
//!
//! Turns an attendee's RSVP into exactly one authoritative ticket, settles paid
//! RSVPs against the payment gateway, and checks guests in at the door.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────┐
//! │           Handlers           │  ← /rsvp and /tickets endpoints
//! └──────┬────────────────┬──────┘
//!        │                │
//! ┌──────▼──────┐  ┌──────▼──────┐
//! │ Settlement  │  │  Check-in   │  ← idempotent business rules
//! └──┬───────┬──┘  └──────┬──────┘
//!    │       │            │
//!    │  ┌────▼─────┐      │
//!    │  │ Gateway  │      │          ← external payment provider
//!    │  └──────────┘      │
//! ┌──▼────────────────────▼──────┐
//! │          Repository          │  ← unique indexes + counter updates
//! └──────────────────────────────┘
//! ```
//!
//! Ticket emails go out through [`notifier::TicketNotifier`] after the write
//! commits and never fail a request.
//!
//! # Usage
//!
//! ```rust,no_run
//! use domain_tickets::{
//!     handlers, CheckInService, InMemoryTicketRepository, SettlementService, TicketNotifier,
//! };
//! use email::{MockEmailProvider, TemplateEngine};
//! use std::sync::Arc;
//!
//! let repository = Arc::new(InMemoryTicketRepository::new());
//! let notifier = TicketNotifier::new(
//!     Arc::new(MockEmailProvider::new()),
//!     TemplateEngine::new().unwrap(),
//!     "Campus Events",
//! );
//! let settlement = SettlementService::new(repository.clone(), None, notifier, "http://localhost:3000");
//! let rsvp = handlers::rsvp_router(settlement, None);
//! ```

pub mod checkin;
pub mod entity;
pub mod error;
pub mod gateway;
pub mod handlers;
pub mod models;
pub mod notifier;
pub mod postgres;
pub mod repository;
pub mod service;

pub use checkin::CheckInService;
pub use error::{TicketError, TicketResult};
pub use gateway::{
    GatewayError, InitializeTransaction, InitializedTransaction, PaymentGateway, PaystackConfig,
    PaystackGateway, VerifiedTransaction, verify_webhook_signature,
};
pub use handlers::{RsvpApiDoc, TicketsApiDoc, rsvp_router, tickets_router};
pub use models::{
    CheckInRequest, CheckInResponse, CheckInTarget, Event, GuestProfile, GuestView,
    InitializeRsvp, InitializeRsvpResponse, MAX_QUANTITY, NewTicket, RsvpIntent, RsvpOutcome,
    Settlement, Ticket, TicketStatus, VerifyPaymentQuery, VerifyPaymentResponse,
};
pub use notifier::TicketNotifier;
pub use postgres::PgTicketRepository;
pub use repository::{CapacityPolicy, CreateOutcome, InMemoryTicketRepository, TicketRepository};
pub use service::SettlementService;
