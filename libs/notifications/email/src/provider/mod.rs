//! Email provider implementations

pub mod mock;
pub mod sendgrid;
pub mod smtp;

pub use mock::MockEmailProvider;
pub use sendgrid::SendGridProvider;
pub use smtp::{SmtpConfig, SmtpProvider};

use crate::models::Email;
use async_trait::async_trait;
use eyre::Result;

#[derive(Debug)]
pub struct SendResult {
    /// Provider-specific message ID
    pub message_id: String,
}

#[async_trait]
pub trait EmailProvider: Send + Sync {
    async fn send(&self, email: &Email) -> Result<SendResult>;

    async fn health_check(&self) -> Result<()>;

    fn name(&self) -> &'static str;
}
