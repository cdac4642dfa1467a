//! Handlebars templates for ticket emails.
//!
//! Each template registers up to three partials under `<name>_subject`,
//! `<name>_text` and `<name>_html`.

use crate::models::Email;
use eyre::{Result, eyre};
use handlebars::Handlebars;
use serde::Serialize;
use std::collections::HashMap;

#[derive(Debug, Clone)]
pub struct RenderedTemplate {
    pub subject: String,
    pub body_text: Option<String>,
    pub body_html: Option<String>,
}

impl RenderedTemplate {
    pub fn into_email(self, to: impl Into<String>) -> Email {
        let mut email = Email::new(to, self.subject);
        email.body_text = self.body_text;
        email.body_html = self.body_html;
        email
    }
}

#[derive(Clone, Debug)]
pub struct EmailTemplate {
    pub name: String,
    pub subject: String,
    pub body_text: Option<String>,
    pub body_html: Option<String>,
}

/// Supports the usual Handlebars syntax: `{{name}}`, `{{#if}}`, `{{#each}}`.
/// Missing variables render as empty strings.
pub struct TemplateEngine {
    handlebars: Handlebars<'static>,
    templates: HashMap<String, EmailTemplate>,
}

impl TemplateEngine {
    /// An engine with `ticket_confirmed` and `payment_receipt` registered.
    pub fn new() -> Result<Self> {
        let mut engine = Self {
            handlebars: Handlebars::new(),
            templates: HashMap::new(),
        };
        engine.register_defaults()?;
        Ok(engine)
    }

    pub fn register(&mut self, template: EmailTemplate) -> Result<()> {
        self.handlebars
            .register_template_string(&format!("{}_subject", template.name), &template.subject)
            .map_err(|e| eyre!("Failed to register subject template: {}", e))?;

        if let Some(text) = &template.body_text {
            self.handlebars
                .register_template_string(&format!("{}_text", template.name), text)
                .map_err(|e| eyre!("Failed to register text template: {}", e))?;
        }

        if let Some(html) = &template.body_html {
            self.handlebars
                .register_template_string(&format!("{}_html", template.name), html)
                .map_err(|e| eyre!("Failed to register HTML template: {}", e))?;
        }

        self.templates.insert(template.name.clone(), template);
        Ok(())
    }

    pub fn render<T: Serialize>(&self, name: &str, data: &T) -> Result<RenderedTemplate> {
        let template = self
            .templates
            .get(name)
            .ok_or_else(|| eyre!("Template not found: {}", name))?;

        let subject = self
            .handlebars
            .render(&format!("{}_subject", name), data)
            .map_err(|e| eyre!("Failed to render subject: {}", e))?;

        let body_text = template
            .body_text
            .as_ref()
            .map(|_| self.handlebars.render(&format!("{}_text", name), data))
            .transpose()
            .map_err(|e| eyre!("Failed to render text: {}", e))?;

        let body_html = template
            .body_html
            .as_ref()
            .map(|_| self.handlebars.render(&format!("{}_html", name), data))
            .transpose()
            .map_err(|e| eyre!("Failed to render HTML: {}", e))?;

        Ok(RenderedTemplate {
            subject,
            body_text,
            body_html,
        })
    }

    pub fn has_template(&self, name: &str) -> bool {
        self.templates.contains_key(name)
    }

    fn register_defaults(&mut self) -> Result<()> {
        // Free RSVP or any confirmed place.
        self.register(EmailTemplate {
            name: "ticket_confirmed".to_string(),
            subject: "You're going to {{event_title}}".to_string(),
            body_text: Some(
                r#"Hello {{name}},

Your place at {{event_title}} is confirmed.

Ticket: {{ticket_id}}
Quantity: {{quantity}}
When: {{event_date}}

Show this ticket id at the door to check in.

{{app_name}}"#
                    .to_string(),
            ),
            body_html: Some(
                r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
</head>
<body style="font-family: Arial, sans-serif; line-height: 1.6; color: #333;">
    <h1 style="color: #2563eb;">You're going to {{event_title}}</h1>
    <p>Hello {{name}},</p>
    <p>Your place is confirmed.</p>
    <table style="border-collapse: collapse;">
        <tr><td style="padding: 4px 12px 4px 0;">Ticket</td><td><code>{{ticket_id}}</code></td></tr>
        <tr><td style="padding: 4px 12px 4px 0;">Quantity</td><td>{{quantity}}</td></tr>
        <tr><td style="padding: 4px 12px 4px 0;">When</td><td>{{event_date}}</td></tr>
    </table>
    <p style="color: #666; font-size: 14px;">Show this ticket id at the door to check in.</p>
    <p>{{app_name}}</p>
</body>
</html>"#
                    .to_string(),
            ),
        })?;

        self.register(EmailTemplate {
            name: "payment_receipt".to_string(),
            subject: "Receipt for {{event_title}}".to_string(),
            body_text: Some(
                r#"Hello {{name}},

We received your payment of {{amount}} for {{event_title}}.

Reference: {{reference}}
Ticket: {{ticket_id}}
Quantity: {{quantity}}

{{app_name}}"#
                    .to_string(),
            ),
            body_html: Some(
                r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
</head>
<body style="font-family: Arial, sans-serif; line-height: 1.6; color: #333;">
    <h1 style="color: #16a34a;">Payment received</h1>
    <p>Hello {{name}},</p>
    <p>We received your payment of <strong>{{amount}}</strong> for {{event_title}}.</p>
    <table style="border-collapse: collapse;">
        <tr><td style="padding: 4px 12px 4px 0;">Reference</td><td><code>{{reference}}</code></td></tr>
        <tr><td style="padding: 4px 12px 4px 0;">Ticket</td><td><code>{{ticket_id}}</code></td></tr>
        <tr><td style="padding: 4px 12px 4px 0;">Quantity</td><td>{{quantity}}</td></tr>
    </table>
    <p>{{app_name}}</p>
</body>
</html>"#
                    .to_string(),
            ),
        })?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_defaults_registered() {
        let engine = TemplateEngine::new().unwrap();
        assert!(engine.has_template("ticket_confirmed"));
        assert!(engine.has_template("payment_receipt"));
        assert!(!engine.has_template("welcome"));
    }

    #[test]
    fn test_render_payment_receipt() {
        let engine = TemplateEngine::new().unwrap();
        let data = json!({
            "name": "Ada",
            "event_title": "Robotics Expo",
            "amount": "1500.00",
            "reference": "ref_123",
            "ticket_id": "t-1",
            "quantity": 2,
            "app_name": "Campus Events"
        });

        let rendered = engine.render("payment_receipt", &data).unwrap();

        assert_eq!(rendered.subject, "Receipt for Robotics Expo");
        let text = rendered.body_text.unwrap();
        assert!(text.contains("1500.00"));
        assert!(text.contains("ref_123"));
        assert!(rendered.body_html.unwrap().contains("Payment received"));
    }

    #[test]
    fn test_unknown_template() {
        let engine = TemplateEngine::new().unwrap();
        assert!(engine.render("welcome", &json!({})).is_err());
    }

    #[test]
    fn test_into_email_carries_bodies() {
        let mut engine = TemplateEngine::new().unwrap();
        engine
            .register(EmailTemplate {
                name: "plain".to_string(),
                subject: "Hi {{name}}".to_string(),
                body_text: Some("Body for {{name}}".to_string()),
                body_html: None,
            })
            .unwrap();

        let email = engine
            .render("plain", &json!({ "name": "Ada" }))
            .unwrap()
            .into_email("ada@campus.edu");

        assert_eq!(email.to, "ada@campus.edu");
        assert_eq!(email.subject, "Hi Ada");
        assert_eq!(email.body_text.as_deref(), Some("Body for Ada"));
        assert!(email.body_html.is_none());
    }
}
