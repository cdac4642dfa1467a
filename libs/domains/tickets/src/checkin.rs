use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

use crate::error::{TicketError, TicketResult};
use crate::models::{CheckInTarget, Event, GuestView, Ticket, TicketStatus};
use crate::repository::TicketRepository;

/// Door-side operations for event organizers.
pub struct CheckInService<R: TicketRepository> {
    repository: Arc<R>,
}

impl<R: TicketRepository> CheckInService<R> {
    pub fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }

    async fn resolve(&self, target: CheckInTarget) -> TicketResult<Ticket> {
        let ticket = match target {
            CheckInTarget::Ticket(ticket_id) => self.repository.find_ticket(ticket_id).await?,
            CheckInTarget::Attendee { user_id, event_id } => {
                self.repository.find_by_attendee(user_id, event_id).await?
            }
        };
        ticket.ok_or(TicketError::TicketNotFound)
    }

    async fn event_of(&self, ticket: &Ticket) -> TicketResult<Event> {
        self.repository
            .find_event(ticket.event_id)
            .await?
            .ok_or(TicketError::EventNotFound(ticket.event_id))
    }

    /// Marks a guest as arrived. Checking in twice returns the first arrival.
    #[tracing::instrument(skip(self))]
    pub async fn check_in(&self, caller_id: Uuid, target: CheckInTarget) -> TicketResult<GuestView> {
        let ticket = self.resolve(target).await?;
        let event = self.event_of(&ticket).await?;

        if event.organizer_id != caller_id {
            return Err(TicketError::Forbidden(
                "Only the event organizer can check in guests".to_string(),
            ));
        }

        let now = Utc::now();
        if now < event.date {
            return Err(TicketError::EventNotStarted);
        }
        if event.end_date.is_some_and(|end| now > end) {
            return Err(TicketError::EventEnded);
        }

        let ticket = match ticket.status {
            TicketStatus::Pending => {
                return Err(TicketError::InvalidState(
                    "Ticket has not been confirmed".to_string(),
                ));
            }
            TicketStatus::CheckedIn => {
                tracing::debug!(ticket_id = %ticket.id, "Guest already checked in");
                ticket
            }
            TicketStatus::Confirmed => {
                let ticket = self.repository.mark_checked_in(ticket.id, now).await?;
                tracing::info!(
                    ticket_id = %ticket.id,
                    user_id = %ticket.user_id,
                    event_id = %ticket.event_id,
                    "Guest checked in"
                );
                ticket
            }
        };

        self.guest_view(ticket).await
    }

    /// The holder or the event organizer may read a ticket.
    pub async fn get_ticket(&self, caller_id: Uuid, ticket_id: Uuid) -> TicketResult<Ticket> {
        let ticket = self.resolve(CheckInTarget::Ticket(ticket_id)).await?;
        if ticket.user_id == caller_id {
            return Ok(ticket);
        }

        let event = self.event_of(&ticket).await?;
        if event.organizer_id == caller_id {
            Ok(ticket)
        } else {
            Err(TicketError::Forbidden(
                "You do not have access to this ticket".to_string(),
            ))
        }
    }

    async fn guest_view(&self, ticket: Ticket) -> TicketResult<GuestView> {
        let profile = self.repository.find_profile(ticket.user_id).await?;
        let (name, email, avatar) = match profile {
            Some(p) => {
                let email = if p.email.is_empty() { ticket.email.clone() } else { p.email };
                (p.name, email, p.avatar_url)
            }
            None => ("Guest".to_string(), ticket.email.clone(), None),
        };

        Ok(GuestView {
            ticket_id: ticket.id,
            name,
            email,
            avatar,
            status: ticket.status,
            checked_in_at: ticket.checked_in_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::GuestProfile;
    use crate::repository::{InMemoryTicketRepository, MockTicketRepository};
    use chrono::Duration;
    use rust_decimal::Decimal;
    use serde_json::json;

    struct Fixture {
        repo: Arc<InMemoryTicketRepository>,
        service: CheckInService<InMemoryTicketRepository>,
        organizer: Uuid,
    }

    async fn fixture(start_offset: Duration, end_offset: Option<Duration>) -> (Fixture, Event) {
        let repo = Arc::new(InMemoryTicketRepository::new());
        let organizer = Uuid::new_v4();
        let now = Utc::now();
        let event = Event {
            id: Uuid::new_v4(),
            organizer_id: organizer,
            title: "Chess Club Open".to_string(),
            registration_fee: Decimal::ZERO,
            ticket_price: None,
            capacity: None,
            tickets_sold: 0,
            rsvp_count: 0,
            date: now + start_offset,
            end_date: end_offset.map(|d| now + d),
        };
        repo.insert_event(event.clone()).await;
        let service = CheckInService::new(repo.clone());
        (
            Fixture {
                repo,
                service,
                organizer,
            },
            event,
        )
    }

    async fn seed_ticket(repo: &InMemoryTicketRepository, event_id: Uuid, status: TicketStatus) -> Ticket {
        let now = Utc::now();
        let ticket = Ticket {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            event_id,
            quantity: 1,
            status,
            payment_reference: Some(format!("ref-{}", Uuid::new_v4().simple())),
            amount_paid: Decimal::ZERO,
            email: "guest@campus.edu".to_string(),
            metadata: json!({}),
            checked_in_at: None,
            created_at: now,
            updated_at: now,
        };
        repo.insert_ticket(ticket.clone()).await;
        ticket
    }

    #[tokio::test]
    async fn test_check_in_within_window() {
        let (f, event) = fixture(-Duration::hours(1), Some(Duration::hours(2))).await;
        let ticket = seed_ticket(&f.repo, event.id, TicketStatus::Confirmed).await;
        f.repo
            .insert_profile(GuestProfile {
                id: ticket.user_id,
                name: "Grace Hopper".to_string(),
                email: "grace@campus.edu".to_string(),
                avatar_url: Some("https://cdn.campus.edu/grace.png".to_string()),
            })
            .await;

        let guest = f
            .service
            .check_in(f.organizer, CheckInTarget::Ticket(ticket.id))
            .await
            .unwrap();

        assert_eq!(guest.ticket_id, ticket.id);
        assert_eq!(guest.name, "Grace Hopper");
        assert_eq!(guest.email, "grace@campus.edu");
        assert_eq!(guest.status, TicketStatus::CheckedIn);
        assert!(guest.checked_in_at.is_some());
    }

    #[tokio::test]
    async fn test_check_in_by_attendee_and_repeat() {
        let (f, event) = fixture(-Duration::hours(1), None).await;
        let ticket = seed_ticket(&f.repo, event.id, TicketStatus::Confirmed).await;
        let target = CheckInTarget::Attendee {
            user_id: ticket.user_id,
            event_id: event.id,
        };

        let first = f.service.check_in(f.organizer, target).await.unwrap();
        let second = f.service.check_in(f.organizer, target).await.unwrap();

        assert_eq!(first.checked_in_at, second.checked_in_at);
        assert_eq!(second.name, "Guest");
        assert_eq!(second.email, "guest@campus.edu");
    }

    #[tokio::test]
    async fn test_pending_ticket_is_invalid_state() {
        let (f, event) = fixture(-Duration::hours(1), None).await;
        let ticket = seed_ticket(&f.repo, event.id, TicketStatus::Pending).await;

        let err = f
            .service
            .check_in(f.organizer, CheckInTarget::Ticket(ticket.id))
            .await
            .unwrap_err();
        assert!(matches!(err, TicketError::InvalidState(_)));
    }

    #[tokio::test]
    async fn test_time_window() {
        let (f, event) = fixture(Duration::hours(2), None).await;
        let ticket = seed_ticket(&f.repo, event.id, TicketStatus::Confirmed).await;
        let err = f
            .service
            .check_in(f.organizer, CheckInTarget::Ticket(ticket.id))
            .await
            .unwrap_err();
        assert!(matches!(err, TicketError::EventNotStarted));

        let (f, event) = fixture(-Duration::hours(5), Some(-Duration::hours(1))).await;
        let ticket = seed_ticket(&f.repo, event.id, TicketStatus::Confirmed).await;
        let err = f
            .service
            .check_in(f.organizer, CheckInTarget::Ticket(ticket.id))
            .await
            .unwrap_err();
        assert!(matches!(err, TicketError::EventEnded));
    }

    #[tokio::test]
    async fn test_unknown_ticket() {
        let (f, _) = fixture(-Duration::hours(1), None).await;
        let err = f
            .service
            .check_in(f.organizer, CheckInTarget::Ticket(Uuid::new_v4()))
            .await
            .unwrap_err();
        assert!(matches!(err, TicketError::TicketNotFound));
    }

    #[tokio::test]
    async fn test_non_organizer_never_writes() {
        let organizer = Uuid::new_v4();
        let now = Utc::now();
        let event = Event {
            id: Uuid::new_v4(),
            organizer_id: organizer,
            title: "Film Night".to_string(),
            registration_fee: Decimal::ZERO,
            ticket_price: None,
            capacity: None,
            tickets_sold: 1,
            rsvp_count: 1,
            date: now - Duration::hours(1),
            end_date: None,
        };
        let ticket = Ticket {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            event_id: event.id,
            quantity: 1,
            status: TicketStatus::Confirmed,
            payment_reference: None,
            amount_paid: Decimal::ZERO,
            email: "guest@campus.edu".to_string(),
            metadata: json!({}),
            checked_in_at: None,
            created_at: now,
            updated_at: now,
        };

        let mut repo = MockTicketRepository::new();
        let found = ticket.clone();
        repo.expect_find_ticket()
            .returning(move |_| Ok(Some(found.clone())));
        repo.expect_find_event()
            .returning(move |_| Ok(Some(event.clone())));
        repo.expect_mark_checked_in().never();

        let service = CheckInService::new(Arc::new(repo));
        let err = service
            .check_in(Uuid::new_v4(), CheckInTarget::Ticket(ticket.id))
            .await
            .unwrap_err();
        assert!(matches!(err, TicketError::Forbidden(_)));
    }

    #[tokio::test]
    async fn test_get_ticket_access() {
        let (f, event) = fixture(Duration::days(1), None).await;
        let ticket = seed_ticket(&f.repo, event.id, TicketStatus::Confirmed).await;

        let as_holder = f.service.get_ticket(ticket.user_id, ticket.id).await.unwrap();
        assert_eq!(as_holder.id, ticket.id);

        let as_organizer = f.service.get_ticket(f.organizer, ticket.id).await.unwrap();
        assert_eq!(as_organizer.id, ticket.id);

        let err = f
            .service
            .get_ticket(Uuid::new_v4(), ticket.id)
            .await
            .unwrap_err();
        assert!(matches!(err, TicketError::Forbidden(_)));
    }
}
