//! Fire-and-forget ticket emails.

use email::{EmailProvider, TemplateEngine};
use serde_json::{Value, json};
use std::sync::Arc;
use tokio::task::JoinHandle;

use crate::models::{Event, Ticket};

/// Renders and sends ticket emails on a detached task. Failures are logged
/// and never reach the caller.
#[derive(Clone)]
pub struct TicketNotifier {
    provider: Arc<dyn EmailProvider>,
    templates: Arc<TemplateEngine>,
    app_name: String,
}

impl TicketNotifier {
    pub fn new(
        provider: Arc<dyn EmailProvider>,
        templates: TemplateEngine,
        app_name: impl Into<String>,
    ) -> Self {
        Self {
            provider,
            templates: Arc::new(templates),
            app_name: app_name.into(),
        }
    }

    pub fn ticket_confirmed(&self, ticket: &Ticket, event: &Event) -> JoinHandle<()> {
        let data = self.base_data(ticket, event);
        self.dispatch("ticket_confirmed", ticket, data)
    }

    pub fn payment_receipt(&self, ticket: &Ticket, event: &Event) -> JoinHandle<()> {
        let mut data = self.base_data(ticket, event);
        data["amount"] = json!(format!("{:.2}", ticket.amount_paid));
        data["reference"] = json!(ticket.payment_reference);
        self.dispatch("payment_receipt", ticket, data)
    }

    fn base_data(&self, ticket: &Ticket, event: &Event) -> Value {
        json!({
            "name": greeting_name(&ticket.email),
            "event_title": event.title,
            "event_date": event.date.format("%A %-d %B %Y, %H:%M UTC").to_string(),
            "ticket_id": ticket.id,
            "quantity": ticket.quantity,
            "app_name": self.app_name,
        })
    }

    fn dispatch(&self, template: &'static str, ticket: &Ticket, data: Value) -> JoinHandle<()> {
        let provider = Arc::clone(&self.provider);
        let templates = Arc::clone(&self.templates);
        let to = ticket.email.clone();
        let ticket_id = ticket.id;

        tokio::spawn(async move {
            if to.is_empty() {
                tracing::warn!(%ticket_id, template, "No recipient for ticket email");
                return;
            }

            let email = match templates.render(template, &data) {
                Ok(rendered) => rendered.into_email(to),
                Err(e) => {
                    tracing::warn!(%ticket_id, template, error = %e, "Failed to render ticket email");
                    return;
                }
            };

            match provider.send(&email).await {
                Ok(result) => tracing::debug!(
                    %ticket_id,
                    template,
                    message_id = %result.message_id,
                    "Ticket email sent"
                ),
                Err(e) => tracing::warn!(
                    %ticket_id,
                    template,
                    provider = provider.name(),
                    error = %e,
                    "Failed to send ticket email"
                ),
            }
        })
    }
}

/// Local part of the address; profiles live elsewhere.
fn greeting_name(email: &str) -> &str {
    email
        .split_once('@')
        .map(|(local, _)| local)
        .filter(|local| !local.is_empty())
        .unwrap_or("there")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TicketStatus;
    use chrono::Utc;
    use email::MockEmailProvider;
    use rust_decimal::Decimal;
    use uuid::Uuid;

    fn fixtures(email: &str) -> (Ticket, Event) {
        let now = Utc::now();
        let event = Event {
            id: Uuid::new_v4(),
            organizer_id: Uuid::new_v4(),
            title: "Career Fair".to_string(),
            registration_fee: Decimal::new(150000, 2),
            ticket_price: None,
            capacity: None,
            tickets_sold: 0,
            rsvp_count: 0,
            date: now,
            end_date: None,
        };
        let ticket = Ticket {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            event_id: event.id,
            quantity: 1,
            status: TicketStatus::Confirmed,
            payment_reference: Some("ref_42".to_string()),
            amount_paid: Decimal::new(150000, 2),
            email: email.to_string(),
            metadata: json!({}),
            checked_in_at: None,
            created_at: now,
            updated_at: now,
        };
        (ticket, event)
    }

    #[tokio::test]
    async fn test_receipt_is_rendered_and_sent() {
        let provider = MockEmailProvider::new();
        let notifier = TicketNotifier::new(
            Arc::new(provider.clone()),
            TemplateEngine::new().unwrap(),
            "Campus Events",
        );
        let (ticket, event) = fixtures("ada@campus.edu");

        notifier.payment_receipt(&ticket, &event).await.unwrap();

        let sent = provider.sent_emails().await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "ada@campus.edu");
        assert_eq!(sent[0].subject, "Receipt for Career Fair");
        let text = sent[0].body_text.as_deref().unwrap();
        assert!(text.contains("1500.00"));
        assert!(text.contains("ref_42"));
        assert!(text.starts_with("Hello ada,"));
    }

    #[tokio::test]
    async fn test_provider_failure_is_swallowed() {
        let notifier = TicketNotifier::new(
            Arc::new(MockEmailProvider::failing("smtp down")),
            TemplateEngine::new().unwrap(),
            "Campus Events",
        );
        let (ticket, event) = fixtures("ada@campus.edu");

        assert!(notifier.ticket_confirmed(&ticket, &event).await.is_ok());
    }

    #[tokio::test]
    async fn test_missing_recipient_sends_nothing() {
        let provider = MockEmailProvider::new();
        let notifier = TicketNotifier::new(
            Arc::new(provider.clone()),
            TemplateEngine::new().unwrap(),
            "Campus Events",
        );
        let (ticket, event) = fixtures("");

        notifier.ticket_confirmed(&ticket, &event).await.unwrap();
        assert_eq!(provider.sent_count().await, 0);
    }

    #[test]
    fn test_greeting_name() {
        assert_eq!(greeting_name("ada@campus.edu"), "ada");
        assert_eq!(greeting_name("@campus.edu"), "there");
        assert_eq!(greeting_name("no-at-sign"), "there");
    }
}
