use thiserror::Error;

pub type NotificationResult<T> = Result<T, NotificationError>;

#[derive(Debug, Error)]
pub enum NotificationError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Template error: {0}")]
    Template(String),

    #[error("Provider error: {0}")]
    Provider(String),
}

impl From<core_config::ConfigError> for NotificationError {
    fn from(err: core_config::ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<eyre::Report> for NotificationError {
    fn from(err: eyre::Report) -> Self {
        Self::Provider(err.to_string())
    }
}
