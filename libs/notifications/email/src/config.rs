//! Provider selection from the environment.

use crate::provider::{EmailProvider, MockEmailProvider, SendGridProvider, SmtpConfig, SmtpProvider};
use core_config::{ConfigError, FromEnv, env_flag, env_optional, env_or_default, env_parse, env_required};
use std::sync::Arc;
use strum::{Display, EnumString};

/// `EMAIL_PROVIDER`: `sendgrid`, `smtp`, `mailhog` or `mock`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum ProviderKind {
    Sendgrid,
    Smtp,
    Mailhog,
    Mock,
}

#[derive(Clone)]
pub struct EmailConfig {
    pub provider: ProviderKind,
    pub from_email: String,
    pub from_name: String,
    pub sendgrid_api_key: Option<String>,
    pub smtp: SmtpConfig,
}

impl std::fmt::Debug for EmailConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmailConfig")
            .field("provider", &self.provider)
            .field("from_email", &self.from_email)
            .field("from_name", &self.from_name)
            .field("sendgrid_api_key", &self.sendgrid_api_key.as_ref().map(|_| "[REDACTED]"))
            .field("smtp", &self.smtp)
            .finish()
    }
}

impl FromEnv for EmailConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let raw_provider = env_or_default("EMAIL_PROVIDER", "mailhog");
        let provider: ProviderKind =
            raw_provider
                .parse()
                .map_err(|_| ConfigError::Invalid {
                    key: "EMAIL_PROVIDER".to_string(),
                    details: format!("unknown provider '{raw_provider}'"),
                })?;

        let from_email = env_or_default("EMAIL_FROM_ADDRESS", "noreply@campus.local");
        let from_name = env_or_default("EMAIL_FROM_NAME", "Campus Events");

        let sendgrid_api_key = match provider {
            ProviderKind::Sendgrid => Some(env_required("SENDGRID_API_KEY")?),
            _ => env_optional("SENDGRID_API_KEY"),
        };

        let smtp = match provider {
            ProviderKind::Smtp => SmtpConfig {
                host: env_required("SMTP_HOST")?,
                port: env_parse("SMTP_PORT", 587)?,
                username: env_or_default("SMTP_USERNAME", ""),
                password: env_or_default("SMTP_PASSWORD", ""),
                from_email: from_email.clone(),
                from_name: from_name.clone(),
                use_tls: env_flag("SMTP_USE_TLS", true)?,
            },
            _ => {
                let mut config = SmtpConfig::mailhog(
                    env_or_default("SMTP_HOST", "localhost"),
                    env_parse("SMTP_PORT", 1025)?,
                    from_email.clone(),
                );
                config.from_name = from_name.clone();
                config
            }
        };

        Ok(Self {
            provider,
            from_email,
            from_name,
            sendgrid_api_key,
            smtp,
        })
    }
}

/// Builds the configured provider. `mock` keeps everything in memory.
pub fn build_provider(config: &EmailConfig) -> eyre::Result<Arc<dyn EmailProvider>> {
    let provider: Arc<dyn EmailProvider> = match config.provider {
        ProviderKind::Sendgrid => {
            let api_key = config
                .sendgrid_api_key
                .clone()
                .ok_or_else(|| eyre::eyre!("SENDGRID_API_KEY not set"))?;
            Arc::new(SendGridProvider::new(
                api_key,
                config.from_email.clone(),
                config.from_name.clone(),
            )?)
        }
        ProviderKind::Smtp | ProviderKind::Mailhog => {
            Arc::new(SmtpProvider::new(config.smtp.clone())?)
        }
        ProviderKind::Mock => Arc::new(MockEmailProvider::new()),
    };

    tracing::info!(provider = provider.name(), "Email provider configured");
    Ok(provider)
}
