use axum::http::{HeaderValue, Method, header};
use core_config::{ConfigError, FromEnv, env_required};
use std::time::Duration;
use tower_http::cors::{AllowOrigin, CorsLayer};

/// Browser origins allowed to call the API.
#[derive(Clone, Debug)]
pub struct CorsConfig {
    pub allowed_origins: Vec<HeaderValue>,
}

impl CorsConfig {
    /// Parses a comma-separated origin list; blanks are skipped.
    pub fn parse(raw: &str) -> Result<Self, ConfigError> {
        let allowed_origins = raw
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| {
                s.parse::<HeaderValue>().map_err(|e| ConfigError::ParseError {
                    key: "CORS_ALLOWED_ORIGIN".to_string(),
                    details: format!("'{s}': {e}"),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        if allowed_origins.is_empty() {
            return Err(ConfigError::Invalid {
                key: "CORS_ALLOWED_ORIGIN".to_string(),
                details: "at least one origin is required".to_string(),
            });
        }

        Ok(Self { allowed_origins })
    }
}

impl FromEnv for CorsConfig {
    /// `CORS_ALLOWED_ORIGIN` (required), e.g.
    /// `http://localhost:3000,https://events.campus.edu`.
    fn from_env() -> Result<Self, ConfigError> {
        Self::parse(&env_required("CORS_ALLOWED_ORIGIN")?)
    }
}

/// Credentialed CORS for the configured origins with a one hour preflight cache.
pub fn create_cors_layer(config: &CorsConfig) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(config.allowed_origins.clone()))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::ACCEPT])
        .allow_credentials(true)
        .max_age(Duration::from_secs(3600))
}
