//! SendGrid email provider (v3 mail send API).

use crate::models::Email;
use crate::provider::{EmailProvider, SendResult};
use async_trait::async_trait;
use eyre::{Result, eyre};
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, error};

const SENDGRID_API_URL: &str = "https://api.sendgrid.com/v3/mail/send";

pub struct SendGridProvider {
    api_key: String,
    from_email: String,
    from_name: String,
    client: Client,
}

impl SendGridProvider {
    pub fn new(
        api_key: impl Into<String>,
        from_email: impl Into<String>,
        from_name: impl Into<String>,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| eyre!("Failed to build SendGrid client: {}", e))?;

        Ok(Self {
            api_key: api_key.into(),
            from_email: from_email.into(),
            from_name: from_name.into(),
            client,
        })
    }
}

#[derive(Debug, Serialize)]
struct SendGridRequest {
    personalizations: Vec<Personalization>,
    from: EmailAddress,
    #[serde(skip_serializing_if = "Option::is_none")]
    reply_to: Option<EmailAddress>,
    subject: String,
    content: Vec<Content>,
}

#[derive(Debug, Serialize)]
struct Personalization {
    to: Vec<EmailAddress>,
}

#[derive(Debug, Serialize)]
struct EmailAddress {
    email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
}

#[derive(Debug, Serialize)]
struct Content {
    #[serde(rename = "type")]
    content_type: &'static str,
    value: String,
}

impl SendGridProvider {
    fn build_request(&self, email: &Email) -> Result<SendGridRequest> {
        // SendGrid wants text/plain before text/html.
        let content: Vec<Content> = [
            ("text/plain", &email.body_text),
            ("text/html", &email.body_html),
        ]
        .into_iter()
        .filter_map(|(content_type, body)| {
            body.as_ref().map(|value| Content {
                content_type,
                value: value.clone(),
            })
        })
        .collect();

        if content.is_empty() {
            return Err(eyre!("Email must have text or HTML content"));
        }

        Ok(SendGridRequest {
            personalizations: vec![Personalization {
                to: vec![EmailAddress {
                    email: email.to.clone(),
                    name: None,
                }],
            }],
            from: EmailAddress {
                email: email.from.clone().unwrap_or_else(|| self.from_email.clone()),
                name: Some(self.from_name.clone()),
            },
            reply_to: email.reply_to.as_ref().map(|r| EmailAddress {
                email: r.clone(),
                name: None,
            }),
            subject: email.subject.clone(),
            content,
        })
    }
}

#[async_trait]
impl EmailProvider for SendGridProvider {
    async fn send(&self, email: &Email) -> Result<SendResult> {
        let request = self.build_request(email)?;

        debug!(to = %email.to, subject = %email.subject, "Sending email via SendGrid");

        let response = self
            .client
            .post(SENDGRID_API_URL)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| eyre!("SendGrid request failed: {}", e))?;

        let status = response.status();

        if status.is_success() {
            let message_id = response
                .headers()
                .get("X-Message-Id")
                .and_then(|v| v.to_str().ok())
                .unwrap_or(&email.id)
                .to_string();

            debug!(message_id = %message_id, "Email sent successfully");

            return Ok(SendResult { message_id });
        }

        let error_body = response.text().await.unwrap_or_default();
        error!(status = %status, error = %error_body, "SendGrid API error");

        match status.as_u16() {
            429 => Err(eyre!("rate limit exceeded")),
            400 => Err(eyre!("invalid request: {}", error_body)),
            401 | 403 => Err(eyre!("authentication failed")),
            _ => Err(eyre!("SendGrid error ({}): {}", status, error_body)),
        }
    }

    async fn health_check(&self) -> Result<()> {
        if self.api_key.is_empty() {
            return Err(eyre!("SendGrid API key not configured"));
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "sendgrid"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider() -> SendGridProvider {
        SendGridProvider::new("SG.test", "events@campus.edu", "Campus Events").unwrap()
    }

    #[test]
    fn test_request_orders_plain_before_html() {
        let email = Email::new("guest@campus.edu", "Ticket")
            .with_html("<p>hi</p>")
            .with_text("hi");

        let json = serde_json::to_value(provider().build_request(&email).unwrap()).unwrap();

        assert_eq!(json["content"][0]["type"], "text/plain");
        assert_eq!(json["content"][1]["type"], "text/html");
        assert_eq!(json["from"]["email"], "events@campus.edu");
        assert_eq!(json["personalizations"][0]["to"][0]["email"], "guest@campus.edu");
        assert!(json.get("reply_to").is_none());
    }

    #[test]
    fn test_request_carries_reply_to() {
        let email = Email::new("guest@campus.edu", "Ticket")
            .with_text("hi")
            .with_reply_to("organizer@campus.edu");

        let json = serde_json::to_value(provider().build_request(&email).unwrap()).unwrap();

        assert_eq!(json["reply_to"]["email"], "organizer@campus.edu");
    }

    #[test]
    fn test_request_requires_a_body() {
        let email = Email::new("guest@campus.edu", "Ticket");
        assert!(provider().build_request(&email).is_err());
    }
}
