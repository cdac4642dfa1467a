//! PostgreSQL plumbing shared by the services: pool configuration, connecting
//! with retry, running a sea-orm `Migrator`, readiness checks and a thin
//! generic repository over a sea-orm entity.
//!
//! # Features
//!
//! - `postgres` (default) - SeaORM connector, migrations, `BaseRepository`
//! - `config` - `core_config::FromEnv` for `PostgresConfig`
//!
//! ```ignore
//! use database::postgres::{self, PostgresConfig};
//! use database::common::RetryConfig;
//!
//! let db = postgres::connect_from_config_with_retry(config, Some(RetryConfig::new())).await?;
//! postgres::run_migrations::<migration::Migrator>(&db, "campus_api").await?;
//! ```

pub mod common;

#[cfg(feature = "postgres")]
pub mod postgres;

#[cfg(feature = "postgres")]
pub mod repository;

pub use common::{DatabaseError, DatabaseResult};

#[cfg(feature = "postgres")]
pub use repository::BaseRepository;
