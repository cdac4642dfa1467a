//! SMTP email provider using lettre

use super::{EmailProvider, SendResult};
use crate::models::Email;
use async_trait::async_trait;
use eyre::{Result, WrapErr};
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{Mailbox, MultiPart, SinglePart, header::ContentType},
    transport::smtp::authentication::Credentials,
};

#[derive(Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub from_email: String,
    pub from_name: String,
    pub use_tls: bool,
}

impl SmtpConfig {
    /// Unauthenticated plaintext relay, as exposed by Mailhog/Mailpit.
    pub fn mailhog(host: impl Into<String>, port: u16, from_email: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port,
            username: String::new(),
            password: String::new(),
            from_email: from_email.into(),
            from_name: "Campus Events (dev)".to_string(),
            use_tls: false,
        }
    }
}

impl std::fmt::Debug for SmtpConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .field("from_email", &self.from_email)
            .field("use_tls", &self.use_tls)
            .finish()
    }
}

pub struct SmtpProvider {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpProvider {
    pub fn new(config: SmtpConfig) -> Result<Self> {
        let transport = if config.use_tls {
            let creds = Credentials::new(config.username.clone(), config.password.clone());
            AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)
                .wrap_err("Failed to create SMTP relay")?
                .credentials(creds)
                .port(config.port)
                .build()
        } else if !config.username.is_empty() {
            let creds = Credentials::new(config.username.clone(), config.password.clone());
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.host)
                .credentials(creds)
                .port(config.port)
                .build()
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.host)
                .port(config.port)
                .build()
        };

        let from: Mailbox = format!("{} <{}>", config.from_name, config.from_email)
            .parse()
            .wrap_err("Invalid from address")?;

        Ok(Self { transport, from })
    }

    fn build_message(&self, email: &Email) -> Result<Message> {
        let from = match &email.from {
            Some(address) => address.parse().wrap_err("Invalid from address")?,
            None => self.from.clone(),
        };
        let to: Mailbox = email.to.parse().wrap_err("Invalid to address")?;

        let mut builder = Message::builder().from(from).to(to).subject(&email.subject);

        if let Some(reply_to) = &email.reply_to {
            let reply_to: Mailbox = reply_to.parse().wrap_err("Invalid reply-to address")?;
            builder = builder.reply_to(reply_to);
        }

        let message = match (&email.body_text, &email.body_html) {
            (Some(text), Some(html)) => builder
                .multipart(
                    MultiPart::alternative()
                        .singlepart(
                            SinglePart::builder()
                                .header(ContentType::TEXT_PLAIN)
                                .body(text.clone()),
                        )
                        .singlepart(
                            SinglePart::builder()
                                .header(ContentType::TEXT_HTML)
                                .body(html.clone()),
                        ),
                )
                .wrap_err("Failed to build multipart message")?,
            (Some(text), None) => builder
                .header(ContentType::TEXT_PLAIN)
                .body(text.clone())
                .wrap_err("Failed to build text message")?,
            (None, Some(html)) => builder
                .header(ContentType::TEXT_HTML)
                .body(html.clone())
                .wrap_err("Failed to build HTML message")?,
            (None, None) => {
                return Err(eyre::eyre!("Email must have either text or HTML body"));
            }
        };

        Ok(message)
    }
}

#[async_trait]
impl EmailProvider for SmtpProvider {
    async fn send(&self, email: &Email) -> Result<SendResult> {
        let message = self.build_message(email)?;

        let response = self
            .transport
            .send(message)
            .await
            .wrap_err("Failed to send email via SMTP")?;

        let message_id = response
            .message()
            .next()
            .map(|s| s.to_string())
            .unwrap_or_else(|| email.id.clone());

        tracing::info!(email_id = %email.id, to = %email.to, "Email sent via SMTP");

        Ok(SendResult { message_id })
    }

    async fn health_check(&self) -> Result<()> {
        self.transport
            .test_connection()
            .await
            .wrap_err("SMTP health check failed")?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "smtp"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider() -> SmtpProvider {
        SmtpProvider::new(SmtpConfig::mailhog("localhost", 1025, "events@campus.edu")).unwrap()
    }

    #[test]
    fn test_build_multipart_message() {
        let email = Email::new("guest@campus.edu", "Your ticket")
            .with_text("plain")
            .with_html("<p>html</p>");

        let formatted = String::from_utf8(provider().build_message(&email).unwrap().formatted())
            .unwrap();

        assert!(formatted.contains("multipart/alternative"));
        assert!(formatted.contains("Subject: Your ticket"));
    }

    #[test]
    fn test_build_rejects_bad_recipient() {
        let email = Email::new("not-an-address", "Your ticket").with_text("plain");
        assert!(provider().build_message(&email).is_err());
    }

    #[test]
    fn test_config_debug_redacts_password() {
        let mut config = SmtpConfig::mailhog("localhost", 1025, "events@campus.edu");
        config.password = "hunter2".to_string();
        assert!(!format!("{config:?}").contains("hunter2"));
    }
}
