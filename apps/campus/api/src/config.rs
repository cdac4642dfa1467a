use axum_helpers::{CorsConfig, JwtConfig};
use core_config::{AppInfo, FromEnv, app_info, env_flag, env_or_default, server::ServerConfig};
use database::postgres::PostgresConfig;
use domain_tickets::PaystackConfig;
use email::EmailConfig;

pub use core_config::Environment;

/// Application-specific configuration
/// Composes shared config components from the `config` library
#[derive(Clone, Debug)]
pub struct Config {
    pub app: AppInfo,
    pub environment: Environment,
    pub server: ServerConfig,
    pub cors: CorsConfig,
    pub database: PostgresConfig,
    pub jwt: JwtConfig,
    pub payments: PaystackConfig,
    pub email: EmailConfig,
    /// Base of the web app; payment callbacks land on `<frontend_url>/events/...`.
    pub frontend_url: String,
    /// Sender name in ticket emails.
    pub app_name: String,
    pub run_migrations: bool,
}

impl Config {
    pub fn from_env() -> eyre::Result<Self> {
        let environment = Environment::from_env();
        let server = ServerConfig::from_env()?; // HOST=0.0.0.0, PORT=8080 by default
        let cors = CorsConfig::from_env()?;
        let database = PostgresConfig::from_env()?; // Required - will fail if not set
        let jwt = JwtConfig::from_env()?;
        let payments = PaystackConfig::from_env()?; // Secret optional; unset disables paid RSVPs
        let email = EmailConfig::from_env()?;

        Ok(Self {
            app: app_info!(),
            environment,
            server,
            cors,
            database,
            jwt,
            payments,
            email,
            frontend_url: env_or_default("FRONTEND_URL", "http://localhost:3000"),
            app_name: env_or_default("APP_NAME", "Campus Events"),
            run_migrations: env_flag("RUN_MIGRATIONS", true)?,
        })
    }
}
