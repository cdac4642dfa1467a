use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::{TicketError, TicketResult};
use crate::models::{Event, GuestProfile, NewTicket, Ticket, TicketStatus};

/// What to do when the capacity condition fails while writing a ticket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapacityPolicy {
    /// Roll back and report [`TicketError::CapacityExceeded`].
    Enforce,
    /// Keep the ticket and bump the counters anyway; money has already moved.
    Overshoot,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CreateOutcome {
    Created { ticket: Ticket, overbooked: bool },
    /// A ticket for the same reference or the same attendee already existed;
    /// nothing was written.
    Duplicate(Ticket),
}

/// Ticket persistence plus the event counters it moves.
///
/// Implementations must enforce one ticket per (user, event) and one ticket
/// per payment reference, and must write the ticket and the counter increment
/// atomically.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TicketRepository: Send + Sync {
    async fn find_event(&self, event_id: Uuid) -> TicketResult<Option<Event>>;

    async fn find_ticket(&self, ticket_id: Uuid) -> TicketResult<Option<Ticket>>;

    async fn find_by_reference(&self, reference: &str) -> TicketResult<Option<Ticket>>;

    async fn find_by_attendee(&self, user_id: Uuid, event_id: Uuid)
    -> TicketResult<Option<Ticket>>;

    async fn find_profile(&self, user_id: Uuid) -> TicketResult<Option<GuestProfile>>;

    /// Writes a `confirmed` ticket and increments `tickets_sold` and
    /// `rsvp_count` by its quantity.
    async fn create_confirmed(
        &self,
        ticket: NewTicket,
        policy: CapacityPolicy,
    ) -> TicketResult<CreateOutcome>;

    /// `confirmed → checked-in`. A ticket already checked in is returned
    /// unchanged; a pending one is an [`TicketError::InvalidState`].
    async fn mark_checked_in(&self, ticket_id: Uuid, at: DateTime<Utc>) -> TicketResult<Ticket>;
}

#[derive(Debug, Default)]
struct Store {
    events: HashMap<Uuid, Event>,
    tickets: HashMap<Uuid, Ticket>,
    profiles: HashMap<Uuid, GuestProfile>,
}

impl Store {
    fn existing_for(&self, ticket: &NewTicket) -> Option<&Ticket> {
        self.tickets
            .values()
            .find(|t| t.payment_reference.as_deref() == Some(ticket.reference.as_str()))
            .or_else(|| {
                self.tickets
                    .values()
                    .find(|t| t.user_id == ticket.user_id && t.event_id == ticket.event_id)
            })
    }
}

/// In-memory implementation of TicketRepository (for development/testing)
///
/// One lock guards tickets and counters together, which gives the same
/// all-or-nothing write the Postgres implementation gets from a transaction.
#[derive(Debug, Default, Clone)]
pub struct InMemoryTicketRepository {
    store: Arc<RwLock<Store>>,
}

impl InMemoryTicketRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_event(&self, event: Event) {
        self.store.write().await.events.insert(event.id, event);
    }

    pub async fn insert_profile(&self, profile: GuestProfile) {
        self.store.write().await.profiles.insert(profile.id, profile);
    }

    /// Seeds a ticket as-is, bypassing counters; for legacy states such as `pending`.
    pub async fn insert_ticket(&self, ticket: Ticket) {
        self.store.write().await.tickets.insert(ticket.id, ticket);
    }

    pub async fn ticket_count(&self) -> usize {
        self.store.read().await.tickets.len()
    }
}

#[async_trait]
impl TicketRepository for InMemoryTicketRepository {
    async fn find_event(&self, event_id: Uuid) -> TicketResult<Option<Event>> {
        Ok(self.store.read().await.events.get(&event_id).cloned())
    }

    async fn find_ticket(&self, ticket_id: Uuid) -> TicketResult<Option<Ticket>> {
        Ok(self.store.read().await.tickets.get(&ticket_id).cloned())
    }

    async fn find_by_reference(&self, reference: &str) -> TicketResult<Option<Ticket>> {
        let store = self.store.read().await;
        Ok(store
            .tickets
            .values()
            .find(|t| t.payment_reference.as_deref() == Some(reference))
            .cloned())
    }

    async fn find_by_attendee(
        &self,
        user_id: Uuid,
        event_id: Uuid,
    ) -> TicketResult<Option<Ticket>> {
        let store = self.store.read().await;
        Ok(store
            .tickets
            .values()
            .find(|t| t.user_id == user_id && t.event_id == event_id)
            .cloned())
    }

    async fn find_profile(&self, user_id: Uuid) -> TicketResult<Option<GuestProfile>> {
        Ok(self.store.read().await.profiles.get(&user_id).cloned())
    }

    async fn create_confirmed(
        &self,
        input: NewTicket,
        policy: CapacityPolicy,
    ) -> TicketResult<CreateOutcome> {
        let mut store = self.store.write().await;

        if let Some(existing) = store.existing_for(&input) {
            return Ok(CreateOutcome::Duplicate(existing.clone()));
        }

        let event = store
            .events
            .get_mut(&input.event_id)
            .ok_or(TicketError::EventNotFound(input.event_id))?;

        let overbooked = !event.has_room_for(input.quantity);
        if overbooked && policy == CapacityPolicy::Enforce {
            return Err(TicketError::CapacityExceeded {
                event_id: input.event_id,
            });
        }

        let (Some(sold), Some(rsvps)) = (
            event.tickets_sold.checked_add(input.quantity),
            event.rsvp_count.checked_add(input.quantity),
        ) else {
            return Err(TicketError::Internal(format!(
                "ticket counters for event {} would overflow",
                input.event_id
            )));
        };
        event.tickets_sold = sold;
        event.rsvp_count = rsvps;

        let now = Utc::now();
        let ticket = Ticket {
            id: Uuid::now_v7(),
            user_id: input.user_id,
            event_id: input.event_id,
            quantity: input.quantity,
            status: TicketStatus::Confirmed,
            payment_reference: Some(input.reference),
            amount_paid: input.amount_paid,
            email: input.email,
            metadata: input.metadata,
            checked_in_at: None,
            created_at: now,
            updated_at: now,
        };
        store.tickets.insert(ticket.id, ticket.clone());

        Ok(CreateOutcome::Created { ticket, overbooked })
    }

    async fn mark_checked_in(&self, ticket_id: Uuid, at: DateTime<Utc>) -> TicketResult<Ticket> {
        let mut store = self.store.write().await;
        let ticket = store
            .tickets
            .get_mut(&ticket_id)
            .ok_or(TicketError::TicketNotFound)?;

        match ticket.status {
            TicketStatus::Confirmed => {
                ticket.status = TicketStatus::CheckedIn;
                ticket.checked_in_at = Some(at);
                ticket.updated_at = at;
            }
            TicketStatus::CheckedIn => {}
            TicketStatus::Pending => {
                return Err(TicketError::InvalidState(
                    "ticket has not been confirmed".to_string(),
                ));
            }
        }

        Ok(ticket.clone())
    }
}
