//! Transactional email for the campus services.
//!
//! ## Components
//!
//! - **Models**: [`Email`] with builder helpers
//! - **Providers**: SendGrid (HTTP API), SMTP via lettre, and an in-memory mock
//! - **Templates**: Handlebars-based [`TemplateEngine`] with the ticket templates
//! - **Config**: [`EmailConfig`] picks and builds a provider from the environment
//!
//! ```ignore
//! use email::{EmailConfig, TemplateEngine, build_provider};
//! use core_config::FromEnv;
//!
//! let provider = build_provider(&EmailConfig::from_env()?)?;
//! let templates = TemplateEngine::new()?;
//! let rendered = templates.render("ticket_confirmed", &data)?;
//! provider.send(&rendered.into_email("guest@campus.edu")).await?;
//! ```

pub mod config;
pub mod error;
pub mod models;
pub mod provider;
pub mod templates;

pub use config::{EmailConfig, ProviderKind, build_provider};
pub use error::{NotificationError, NotificationResult};
pub use models::Email;
pub use provider::{
    EmailProvider, MockEmailProvider, SendGridProvider, SendResult, SmtpConfig, SmtpProvider,
};
pub use templates::{EmailTemplate, RenderedTemplate, TemplateEngine};
