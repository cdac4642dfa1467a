//! In-memory provider that captures sent emails for assertions.

use super::{EmailProvider, SendResult};
use crate::models::Email;
use async_trait::async_trait;
use eyre::Result;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Clones share the same outbox, so a test can keep one handle and give
/// another to the code under test.
#[derive(Clone, Default)]
pub struct MockEmailProvider {
    sent_emails: Arc<Mutex<Vec<Email>>>,
    failure_message: Option<String>,
}

impl MockEmailProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// A provider whose every send fails with `message`.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            sent_emails: Arc::default(),
            failure_message: Some(message.into()),
        }
    }

    pub async fn sent_emails(&self) -> Vec<Email> {
        self.sent_emails.lock().await.clone()
    }

    pub async fn sent_count(&self) -> usize {
        self.sent_emails.lock().await.len()
    }

    pub async fn was_sent_to(&self, address: &str) -> bool {
        self.sent_emails
            .lock()
            .await
            .iter()
            .any(|e| e.to == address)
    }
}

#[async_trait]
impl EmailProvider for MockEmailProvider {
    async fn send(&self, email: &Email) -> Result<SendResult> {
        if let Some(message) = &self.failure_message {
            return Err(eyre::eyre!("{message}"));
        }

        self.sent_emails.lock().await.push(email.clone());

        Ok(SendResult {
            message_id: format!("mock-{}", email.id),
        })
    }

    async fn health_check(&self) -> Result<()> {
        match &self.failure_message {
            Some(_) => Err(eyre::eyre!("Mock health check failed")),
            None => Ok(()),
        }
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}
