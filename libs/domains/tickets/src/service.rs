use chrono::Utc;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::error::{TicketError, TicketResult};
use crate::gateway::{InitializeTransaction, PaymentGateway};
use crate::models::{Event, InitializeRsvp, NewTicket, RsvpIntent, RsvpOutcome, Settlement};
use crate::notifier::TicketNotifier;
use crate::repository::{CapacityPolicy, CreateOutcome, TicketRepository};

/// Turns RSVPs into tickets.
///
/// Free events are settled immediately. Paid events hand the attendee to the
/// gateway and are settled by [`SettlementService::verify_payment`], which is
/// safe to call any number of times for the same reference.
pub struct SettlementService<R: TicketRepository> {
    repository: Arc<R>,
    gateway: Option<Arc<dyn PaymentGateway>>,
    notifier: TicketNotifier,
    frontend_url: String,
}

impl<R: TicketRepository> SettlementService<R> {
    pub fn new(
        repository: Arc<R>,
        gateway: Option<Arc<dyn PaymentGateway>>,
        notifier: TicketNotifier,
        frontend_url: impl Into<String>,
    ) -> Self {
        Self {
            repository,
            gateway,
            notifier,
            frontend_url: frontend_url.into(),
        }
    }

    fn gateway(&self) -> TicketResult<&Arc<dyn PaymentGateway>> {
        self.gateway.as_ref().ok_or(TicketError::GatewayUnconfigured)
    }

    async fn require_event(&self, event_id: Uuid) -> TicketResult<Event> {
        self.repository
            .find_event(event_id)
            .await?
            .ok_or(TicketError::EventNotFound(event_id))
    }

    #[tracing::instrument(skip(self, input), fields(user_id = %input.user_id, event_id = %input.event_id))]
    pub async fn initialize_rsvp(&self, input: InitializeRsvp) -> TicketResult<RsvpOutcome> {
        input
            .validate()
            .map_err(|e| TicketError::Validation(e.to_string()))?;

        let event = self.require_event(input.event_id).await?;

        if let Some(existing) = self
            .repository
            .find_by_attendee(input.user_id, input.event_id)
            .await?
        {
            return Err(TicketError::AlreadyRegistered {
                ticket_id: existing.id,
            });
        }

        if !event.has_room_for(input.quantity) {
            return Err(TicketError::CapacityExceeded { event_id: event.id });
        }

        let intent = RsvpIntent {
            user_id: input.user_id,
            event_id: input.event_id,
            quantity: input.quantity,
        };

        if event.is_free() {
            self.settle_free(&event, &input, intent).await
        } else {
            self.start_checkout(&event, &input, intent).await
        }
    }

    async fn settle_free(
        &self,
        event: &Event,
        input: &InitializeRsvp,
        intent: RsvpIntent,
    ) -> TicketResult<RsvpOutcome> {
        let new_ticket = NewTicket {
            user_id: input.user_id,
            event_id: input.event_id,
            quantity: input.quantity,
            reference: free_reference(),
            amount_paid: Decimal::ZERO,
            email: input.email.clone(),
            metadata: intent.to_metadata(),
        };

        match self
            .repository
            .create_confirmed(new_ticket, CapacityPolicy::Enforce)
            .await?
        {
            CreateOutcome::Created { ticket, .. } => {
                tracing::info!(
                    ticket_id = %ticket.id,
                    reference = ticket.payment_reference.as_deref(),
                    quantity = ticket.quantity,
                    "Free RSVP confirmed"
                );
                self.notifier.ticket_confirmed(&ticket, event);
                Ok(RsvpOutcome::Free {
                    ticket_id: ticket.id,
                })
            }
            CreateOutcome::Duplicate(existing) => Err(TicketError::AlreadyRegistered {
                ticket_id: existing.id,
            }),
        }
    }

    async fn start_checkout(
        &self,
        event: &Event,
        input: &InitializeRsvp,
        intent: RsvpIntent,
    ) -> TicketResult<RsvpOutcome> {
        let gateway = self.gateway()?;
        let amount = amount_in_minor_units(event.unit_price(), input.quantity)?;

        let initialized = gateway
            .initialize_transaction(InitializeTransaction {
                email: input.email.clone(),
                amount,
                callback_url: self.callback_url(event.id),
                metadata: intent.to_metadata(),
            })
            .await?;

        if initialized.authorization_url.trim().is_empty() || initialized.reference.trim().is_empty()
        {
            return Err(TicketError::GatewayBadResponse(
                "initialize response without authorization_url or reference".to_string(),
            ));
        }

        tracing::info!(
            reference = %initialized.reference,
            amount,
            quantity = input.quantity,
            "Checkout initialized"
        );

        Ok(RsvpOutcome::Paid {
            authorization_url: initialized.authorization_url,
            reference: initialized.reference,
        })
    }

    fn callback_url(&self, event_id: Uuid) -> String {
        format!(
            "{}/events/{}/payment-callback",
            self.frontend_url.trim_end_matches('/'),
            event_id
        )
    }

    /// Settles a gateway reference into a ticket.
    ///
    /// Repeated or concurrent calls with the same reference return the same
    /// ticket id and move the event counters once.
    #[tracing::instrument(skip(self))]
    pub async fn verify_payment(&self, reference: &str) -> TicketResult<Settlement> {
        let reference = reference.trim();
        if reference.is_empty() {
            return Err(TicketError::Validation("reference is required".to_string()));
        }

        if let Some(settled) = self.settled_by_reference(reference).await? {
            return Ok(settled);
        }

        let verified = match self.gateway()?.verify_transaction(reference).await {
            Ok(verified) => verified,
            Err(e) if e.is_client_rejection() => {
                tracing::warn!(reference, error = %e, "Gateway rejected verification");
                return Err(TicketError::PaymentFailed {
                    reference: reference.to_string(),
                    status: "rejected".to_string(),
                });
            }
            Err(e) => return Err(e.into()),
        };

        if !verified.is_success() {
            tracing::info!(reference, status = %verified.status, "Payment not successful");
            return Err(TicketError::PaymentFailed {
                reference: reference.to_string(),
                status: verified.status,
            });
        }

        // The gateway call can take seconds; another caller may have settled meanwhile.
        if let Some(settled) = self.settled_by_reference(reference).await? {
            return Ok(settled);
        }

        let intent = RsvpIntent::from_metadata(&verified.metadata).map_err(|e| {
            tracing::error!(
                reference,
                amount_minor_units = verified.amount_minor_units,
                payer_email = verified.payer_email.as_deref(),
                error = %e,
                "Verified payment carries unusable metadata; reconcile manually"
            );
            TicketError::BadMetadata {
                reference: reference.to_string(),
                reason: e.to_string(),
            }
        })?;

        let event = match self.repository.find_event(intent.event_id).await? {
            Some(event) => event,
            None => {
                tracing::error!(
                    reference,
                    event_id = %intent.event_id,
                    amount_minor_units = verified.amount_minor_units,
                    "Verified payment for an unknown event; reconcile manually"
                );
                return Err(TicketError::EventNotFound(intent.event_id));
            }
        };

        if let Some(existing) = self
            .repository
            .find_by_attendee(intent.user_id, intent.event_id)
            .await?
        {
            tracing::warn!(
                reference,
                ticket_id = %existing.id,
                user_id = %intent.user_id,
                event_id = %intent.event_id,
                "Attendee already holds a ticket under another reference"
            );
            return Ok(Settlement {
                ticket_id: existing.id,
                already_registered: true,
                created: false,
            });
        }

        let email = verified.payer_email.clone().unwrap_or_else(|| {
            tracing::warn!(reference, "Verified payment has no payer email");
            String::new()
        });

        let new_ticket = NewTicket {
            user_id: intent.user_id,
            event_id: intent.event_id,
            quantity: intent.quantity,
            reference: reference.to_string(),
            amount_paid: Decimal::new(verified.amount_minor_units, 2),
            email,
            metadata: verified.metadata,
        };

        match self
            .repository
            .create_confirmed(new_ticket, CapacityPolicy::Overshoot)
            .await?
        {
            CreateOutcome::Created { ticket, overbooked } => {
                if overbooked {
                    tracing::error!(
                        ticket_id = %ticket.id,
                        event_id = %event.id,
                        reference,
                        capacity = event.capacity_limit(),
                        quantity = ticket.quantity,
                        "Paid ticket pushed event over capacity"
                    );
                }
                tracing::info!(
                    ticket_id = %ticket.id,
                    user_id = %ticket.user_id,
                    event_id = %ticket.event_id,
                    reference,
                    amount_paid = %ticket.amount_paid,
                    "Payment settled"
                );
                self.notifier.payment_receipt(&ticket, &event);
                Ok(Settlement {
                    ticket_id: ticket.id,
                    already_registered: false,
                    created: true,
                })
            }
            CreateOutcome::Duplicate(winner) => {
                let same_reference = winner.payment_reference.as_deref() == Some(reference);
                tracing::debug!(
                    ticket_id = %winner.id,
                    reference,
                    same_reference,
                    "Lost settlement race"
                );
                Ok(Settlement {
                    ticket_id: winner.id,
                    already_registered: !same_reference,
                    created: false,
                })
            }
        }
    }

    async fn settled_by_reference(&self, reference: &str) -> TicketResult<Option<Settlement>> {
        Ok(self
            .repository
            .find_by_reference(reference)
            .await?
            .map(|ticket| Settlement {
                ticket_id: ticket.id,
                already_registered: false,
                created: false,
            }))
    }
}

/// `FREE-<unix millis>-<8 hex chars>`
fn free_reference() -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("FREE-{}-{}", Utc::now().timestamp_millis(), &suffix[..8])
}

/// Major units times quantity, in minor units, half away from zero.
fn amount_in_minor_units(unit_price: Decimal, quantity: i32) -> TicketResult<i64> {
    (unit_price * Decimal::from(quantity) * Decimal::ONE_HUNDRED)
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
        .ok_or_else(|| TicketError::Internal("charge amount out of range".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::{
        GatewayError, InitializedTransaction, MockPaymentGateway, VerifiedTransaction,
    };
    use crate::models::{Ticket, TicketStatus};
    use crate::repository::InMemoryTicketRepository;
    use chrono::Duration;
    use email::{MockEmailProvider, TemplateEngine};
    use serde_json::{Value, json};

    struct Harness {
        repo: Arc<InMemoryTicketRepository>,
        emails: MockEmailProvider,
    }

    impl Harness {
        fn new() -> Self {
            Self {
                repo: Arc::new(InMemoryTicketRepository::new()),
                emails: MockEmailProvider::new(),
            }
        }

        fn service(
            &self,
            gateway: Option<MockPaymentGateway>,
        ) -> SettlementService<InMemoryTicketRepository> {
            let notifier = TicketNotifier::new(
                Arc::new(self.emails.clone()),
                TemplateEngine::new().unwrap(),
                "Campus Events",
            );
            SettlementService::new(
                self.repo.clone(),
                gateway.map(|g| Arc::new(g) as Arc<dyn PaymentGateway>),
                notifier,
                "https://campus.example/",
            )
        }

        async fn event(&self, fee_minor: i64, capacity: Option<i32>, sold: i32) -> Event {
            let event = Event {
                id: Uuid::new_v4(),
                organizer_id: Uuid::new_v4(),
                title: "Robotics Demo Day".to_string(),
                registration_fee: Decimal::new(fee_minor, 2),
                ticket_price: None,
                capacity,
                tickets_sold: sold,
                rsvp_count: sold,
                date: Utc::now() + Duration::days(3),
                end_date: None,
            };
            self.repo.insert_event(event.clone()).await;
            event
        }

        async fn stored_event(&self, id: Uuid) -> Event {
            self.repo.find_event(id).await.unwrap().unwrap()
        }
    }

    fn rsvp(event_id: Uuid, user_id: Uuid, quantity: i32) -> InitializeRsvp {
        InitializeRsvp {
            user_id,
            event_id,
            email: "guest@campus.edu".to_string(),
            quantity,
        }
    }

    fn verified(status: &str, amount: i64, metadata: Value) -> VerifiedTransaction {
        VerifiedTransaction {
            status: status.to_string(),
            amount_minor_units: amount,
            payer_email: Some("payer@campus.edu".to_string()),
            metadata,
        }
    }

    #[test]
    fn test_amount_in_minor_units() {
        assert_eq!(amount_in_minor_units(Decimal::new(1500, 0), 1).unwrap(), 150000);
        assert_eq!(amount_in_minor_units(Decimal::new(2550, 2), 3).unwrap(), 7650);
        assert_eq!(amount_in_minor_units(Decimal::new(10005, 3), 1).unwrap(), 1001);
    }

    #[test]
    fn test_free_reference_shape() {
        let reference = free_reference();
        let parts: Vec<&str> = reference.split('-').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "FREE");
        assert!(parts[1].parse::<i64>().is_ok());
        assert_eq!(parts[2].len(), 8);
        assert_ne!(free_reference(), free_reference());
    }

    #[tokio::test]
    async fn test_free_rsvp_creates_one_ticket_then_conflicts() {
        let h = Harness::new();
        let event = h.event(0, None, 0).await;
        let service = h.service(None);
        let user = Uuid::new_v4();

        let outcome = service.initialize_rsvp(rsvp(event.id, user, 2)).await.unwrap();
        let RsvpOutcome::Free { ticket_id } = outcome else {
            panic!("expected free outcome, got {outcome:?}");
        };

        let ticket = h.repo.find_ticket(ticket_id).await.unwrap().unwrap();
        assert_eq!(ticket.status, TicketStatus::Confirmed);
        assert_eq!(ticket.amount_paid, Decimal::ZERO);
        assert!(ticket.payment_reference.unwrap().starts_with("FREE-"));

        let stored = h.stored_event(event.id).await;
        assert_eq!(stored.tickets_sold, 2);
        assert_eq!(stored.rsvp_count, 2);

        let err = service
            .initialize_rsvp(rsvp(event.id, user, 1))
            .await
            .unwrap_err();
        assert!(matches!(err, TicketError::AlreadyRegistered { ticket_id: id } if id == ticket_id));
        assert_eq!(h.repo.ticket_count().await, 1);
        assert_eq!(h.stored_event(event.id).await.tickets_sold, 2);
    }

    #[tokio::test]
    async fn test_free_rsvp_sends_confirmation() {
        let h = Harness::new();
        let event = h.event(0, None, 0).await;

        h.service(None)
            .initialize_rsvp(rsvp(event.id, Uuid::new_v4(), 1))
            .await
            .unwrap();

        // Dispatch is detached; give it a moment to run.
        for _ in 0..50 {
            if h.emails.sent_count().await > 0 {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        assert!(h.emails.was_sent_to("guest@campus.edu").await);
    }

    #[tokio::test]
    async fn test_full_event_rejects() {
        let h = Harness::new();
        let event = h.event(0, Some(50), 50).await;

        let err = h
            .service(None)
            .initialize_rsvp(rsvp(event.id, Uuid::new_v4(), 1))
            .await
            .unwrap_err();

        assert!(matches!(err, TicketError::CapacityExceeded { .. }));
        assert_eq!(h.repo.ticket_count().await, 0);
    }

    #[tokio::test]
    async fn test_unknown_event_and_bad_input() {
        let h = Harness::new();
        let service = h.service(None);

        let err = service
            .initialize_rsvp(rsvp(Uuid::new_v4(), Uuid::new_v4(), 1))
            .await
            .unwrap_err();
        assert!(matches!(err, TicketError::EventNotFound(_)));

        let event = h.event(0, None, 0).await;
        let err = service
            .initialize_rsvp(rsvp(event.id, Uuid::new_v4(), 11))
            .await
            .unwrap_err();
        assert!(matches!(err, TicketError::Validation(_)));

        let mut bad_email = rsvp(event.id, Uuid::new_v4(), 1);
        bad_email.email = "not-an-email".to_string();
        let err = service.initialize_rsvp(bad_email).await.unwrap_err();
        assert!(matches!(err, TicketError::Validation(_)));
    }

    #[tokio::test]
    async fn test_paid_rsvp_initializes_checkout() {
        let h = Harness::new();
        let event = h.event(250000, None, 0).await;
        let user = Uuid::new_v4();
        let expected_callback = format!(
            "https://campus.example/events/{}/payment-callback",
            event.id
        );

        let mut gateway = MockPaymentGateway::new();
        gateway
            .expect_initialize_transaction()
            .withf(move |payload| {
                payload.amount == 500000
                    && payload.callback_url == expected_callback
                    && payload.metadata["quantity"] == json!(2)
                    && payload.metadata["userId"] == json!(user)
            })
            .times(1)
            .returning(|_| {
                Ok(InitializedTransaction {
                    authorization_url: "https://checkout.paystack.com/abc".to_string(),
                    reference: "ref_abc".to_string(),
                })
            });

        let outcome = h
            .service(Some(gateway))
            .initialize_rsvp(rsvp(event.id, user, 2))
            .await
            .unwrap();

        assert_eq!(
            outcome,
            RsvpOutcome::Paid {
                authorization_url: "https://checkout.paystack.com/abc".to_string(),
                reference: "ref_abc".to_string(),
            }
        );
        assert_eq!(h.repo.ticket_count().await, 0);
        assert_eq!(h.stored_event(event.id).await.tickets_sold, 0);
    }

    #[tokio::test]
    async fn test_paid_rsvp_without_gateway() {
        let h = Harness::new();
        let event = h.event(1000, None, 0).await;

        let err = h
            .service(None)
            .initialize_rsvp(rsvp(event.id, Uuid::new_v4(), 1))
            .await
            .unwrap_err();
        assert!(matches!(err, TicketError::GatewayUnconfigured));
    }

    #[tokio::test]
    async fn test_paid_rsvp_empty_authorization_url() {
        let h = Harness::new();
        let event = h.event(1000, None, 0).await;

        let mut gateway = MockPaymentGateway::new();
        gateway.expect_initialize_transaction().returning(|_| {
            Ok(InitializedTransaction {
                authorization_url: String::new(),
                reference: "ref_x".to_string(),
            })
        });

        let err = h
            .service(Some(gateway))
            .initialize_rsvp(rsvp(event.id, Uuid::new_v4(), 1))
            .await
            .unwrap_err();
        assert!(matches!(err, TicketError::GatewayBadResponse(_)));
    }

    #[tokio::test]
    async fn test_verify_settles_paid_ticket() {
        let h = Harness::new();
        let event = h.event(500000, Some(100), 0).await;
        let user = Uuid::new_v4();
        let metadata = json!({ "eventId": event.id, "userId": user, "quantity": 1 });

        let mut gateway = MockPaymentGateway::new();
        gateway
            .expect_verify_transaction()
            .withf(|reference| reference == "ref_5000")
            .times(1)
            .returning(move |_| Ok(verified("success", 500000, metadata.clone())));

        let settlement = h
            .service(Some(gateway))
            .verify_payment("ref_5000")
            .await
            .unwrap();

        assert!(settlement.created);
        assert!(!settlement.already_registered);

        let ticket = h.repo.find_ticket(settlement.ticket_id).await.unwrap().unwrap();
        assert_eq!(ticket.amount_paid, Decimal::new(5000, 0));
        assert_eq!(ticket.status, TicketStatus::Confirmed);
        assert_eq!(ticket.email, "payer@campus.edu");
        assert_eq!(ticket.payment_reference.as_deref(), Some("ref_5000"));
        assert_eq!(h.stored_event(event.id).await.tickets_sold, 1);
    }

    #[tokio::test]
    async fn test_verify_twice_returns_same_ticket() {
        let h = Harness::new();
        let event = h.event(150000, None, 0).await;
        let metadata = json!({ "eventId": event.id, "userId": Uuid::new_v4() });

        let mut gateway = MockPaymentGateway::new();
        gateway
            .expect_verify_transaction()
            .times(1)
            .returning(move |_| Ok(verified("success", 150000, metadata.clone())));
        let service = h.service(Some(gateway));

        let first = service.verify_payment("ref_1500").await.unwrap();
        let second = service.verify_payment("  ref_1500 ").await.unwrap();

        assert_eq!(first.ticket_id, second.ticket_id);
        assert!(!second.created);
        assert_eq!(h.repo.ticket_count().await, 1);
        assert_eq!(h.stored_event(event.id).await.tickets_sold, 1);

        let ticket = h.repo.find_ticket(first.ticket_id).await.unwrap().unwrap();
        assert_eq!(ticket.amount_paid, Decimal::new(150000, 2));
    }

    #[tokio::test]
    async fn test_verify_other_reference_reports_already_registered() {
        let h = Harness::new();
        let event = h.event(1000, None, 0).await;
        let user = Uuid::new_v4();
        let metadata = json!({ "eventId": event.id, "userId": user, "qty": 2 });

        let mut gateway = MockPaymentGateway::new();
        gateway
            .expect_verify_transaction()
            .times(2)
            .returning(move |_| Ok(verified("success", 2000, metadata.clone())));
        let service = h.service(Some(gateway));

        let first = service.verify_payment("ref_a").await.unwrap();
        let second = service.verify_payment("ref_b").await.unwrap();

        assert_eq!(first.ticket_id, second.ticket_id);
        assert!(second.already_registered);
        assert_eq!(h.repo.ticket_count().await, 1);
        assert_eq!(h.stored_event(event.id).await.tickets_sold, 2);
    }

    #[tokio::test]
    async fn test_verify_failed_payment() {
        let h = Harness::new();
        let event = h.event(1000, None, 0).await;
        let metadata = json!({ "eventId": event.id, "userId": Uuid::new_v4() });

        let mut gateway = MockPaymentGateway::new();
        gateway
            .expect_verify_transaction()
            .returning(move |_| Ok(verified("abandoned", 1000, metadata.clone())));

        let err = h
            .service(Some(gateway))
            .verify_payment("ref_abandoned")
            .await
            .unwrap_err();

        assert!(matches!(err, TicketError::PaymentFailed { ref status, .. } if status == "abandoned"));
        assert_eq!(h.repo.ticket_count().await, 0);
    }

    #[tokio::test]
    async fn test_verify_unknown_reference_is_payment_failure() {
        let h = Harness::new();

        let mut gateway = MockPaymentGateway::new();
        gateway.expect_verify_transaction().returning(|_| {
            Err(GatewayError::Rejected {
                status: 400,
                message: "Transaction reference not found".to_string(),
            })
        });

        let err = h
            .service(Some(gateway))
            .verify_payment("ref_missing")
            .await
            .unwrap_err();
        assert!(matches!(err, TicketError::PaymentFailed { .. }));
    }

    #[tokio::test]
    async fn test_verify_gateway_outage_is_bad_gateway() {
        let h = Harness::new();

        let mut gateway = MockPaymentGateway::new();
        gateway
            .expect_verify_transaction()
            .returning(|_| Err(GatewayError::Timeout));

        let err = h
            .service(Some(gateway))
            .verify_payment("ref_slow")
            .await
            .unwrap_err();
        assert!(matches!(err, TicketError::Gateway(GatewayError::Timeout)));
    }

    #[tokio::test]
    async fn test_verify_bad_metadata() {
        let h = Harness::new();

        let mut gateway = MockPaymentGateway::new();
        gateway
            .expect_verify_transaction()
            .returning(|_| Ok(verified("success", 1000, json!({ "userId": "nope" }))));

        let err = h
            .service(Some(gateway))
            .verify_payment("ref_orphan")
            .await
            .unwrap_err();
        assert!(matches!(err, TicketError::BadMetadata { ref reference, .. } if reference == "ref_orphan"));
    }

    #[tokio::test]
    async fn test_verify_rejects_oversized_metadata_quantity() {
        let h = Harness::new();
        let event = h.event(1000, Some(10), 5).await;

        let mut gateway = MockPaymentGateway::new();
        let metadata = json!({
            "userId": Uuid::new_v4(),
            "eventId": event.id,
            "quantity": i32::MAX,
        });
        gateway
            .expect_verify_transaction()
            .returning(move |_| Ok(verified("success", 1000, metadata.clone())));

        let err = h
            .service(Some(gateway))
            .verify_payment("ref_flood")
            .await
            .unwrap_err();
        assert!(matches!(err, TicketError::BadMetadata { ref reference, .. } if reference == "ref_flood"));
        assert_eq!(h.repo.ticket_count().await, 0);
    }

    #[tokio::test]
    async fn test_verify_existing_reference_skips_gateway() {
        let h = Harness::new();
        let event = h.event(1000, None, 0).await;
        let now = Utc::now();
        let ticket = Ticket {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            event_id: event.id,
            quantity: 1,
            status: TicketStatus::Confirmed,
            payment_reference: Some("ref_done".to_string()),
            amount_paid: Decimal::new(1000, 2),
            email: "guest@campus.edu".to_string(),
            metadata: json!({}),
            checked_in_at: None,
            created_at: now,
            updated_at: now,
        };
        h.repo.insert_ticket(ticket.clone()).await;

        let mut gateway = MockPaymentGateway::new();
        gateway.expect_verify_transaction().never();

        let settlement = h
            .service(Some(gateway))
            .verify_payment("ref_done")
            .await
            .unwrap();
        assert_eq!(settlement.ticket_id, ticket.id);
    }

    #[tokio::test]
    async fn test_verify_paid_overshoot_keeps_ticket() {
        let h = Harness::new();
        let event = h.event(1000, Some(1), 1).await;
        let metadata = json!({ "eventId": event.id, "userId": Uuid::new_v4() });

        let mut gateway = MockPaymentGateway::new();
        gateway
            .expect_verify_transaction()
            .returning(move |_| Ok(verified("success", 1000, metadata.clone())));

        let settlement = h
            .service(Some(gateway))
            .verify_payment("ref_late")
            .await
            .unwrap();

        assert!(settlement.created);
        assert_eq!(h.stored_event(event.id).await.tickets_sold, 2);
    }

    #[tokio::test]
    async fn test_verify_empty_reference() {
        let h = Harness::new();
        let err = h.service(None).verify_payment("   ").await.unwrap_err();
        assert!(matches!(err, TicketError::Validation(_)));
    }
}
