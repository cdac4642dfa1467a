//! Environment-driven configuration shared by every service in the workspace.
//!
//! Each config struct implements [`FromEnv`]; binaries compose them into a
//! single top-level `Config` at startup and fail fast on the first
//! missing or malformed variable.

pub mod server;
pub mod tracing;

use std::env;
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Environment variable '{0}' is required but not set")]
    MissingEnvVar(String),

    #[error("Failed to parse environment variable '{key}': {details}")]
    ParseError { key: String, details: String },

    #[error("Invalid value for '{key}': {details}")]
    Invalid { key: String, details: String },
}

/// Deployment environment, read from `APP_ENV`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    pub fn from_env() -> Self {
        match env::var("APP_ENV") {
            Ok(value) if value.eq_ignore_ascii_case("production") => Environment::Production,
            _ => Environment::Development,
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Environment::Production)
    }

    pub fn is_development(&self) -> bool {
        matches!(self, Environment::Development)
    }
}

/// Name and version of the running binary, surfaced by `/health`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AppInfo {
    pub name: &'static str,
    pub version: &'static str,
}

/// Builds an [`AppInfo`] from the calling crate's Cargo metadata.
#[macro_export]
macro_rules! app_info {
    () => {
        $crate::AppInfo {
            name: env!("CARGO_PKG_NAME"),
            version: env!("CARGO_PKG_VERSION"),
        }
    };
}

/// Trait for configuration that can be loaded from environment variables
pub trait FromEnv: Sized {
    fn from_env() -> Result<Self, ConfigError>;
}

pub fn env_or_default(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

pub fn env_required(key: &str) -> Result<String, ConfigError> {
    env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Unset or blank variables count as absent.
pub fn env_optional(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Parses `key` into `T`, falling back to `default` when the variable is unset.
pub fn env_parse<T>(key: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::ParseError {
            key: key.to_string(),
            details: e.to_string(),
        }),
        Err(_) => Ok(default),
    }
}

/// Accepts `true/false`, `1/0`, `yes/no` and `on/off`.
pub fn env_flag(key: &str, default: bool) -> Result<bool, ConfigError> {
    let Ok(raw) = env::var(key) else {
        return Ok(default);
    };
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        other => Err(ConfigError::ParseError {
            key: key.to_string(),
            details: format!("expected a boolean, got '{other}'"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_environment_defaults_to_development() {
        temp_env::with_var_unset("APP_ENV", || {
            let env = Environment::from_env();
            assert_eq!(env, Environment::Development);
            assert!(env.is_development());
        });
    }

    #[test]
    fn test_environment_production_case_insensitive() {
        for value in ["production", "PRODUCTION", "Production"] {
            temp_env::with_var("APP_ENV", Some(value), || {
                assert!(Environment::from_env().is_production());
            });
        }
    }

    #[test]
    fn test_environment_unknown_defaults_to_development() {
        temp_env::with_var("APP_ENV", Some("staging"), || {
            assert_eq!(Environment::from_env(), Environment::Development);
        });
    }

    #[test]
    fn test_app_info_macro_uses_crate_metadata() {
        let info = app_info!();
        assert_eq!(info.name, "core_config");
        assert!(!info.version.is_empty());
    }

    #[test]
    fn test_env_or_default() {
        temp_env::with_var("CFG_TEST_VAR", Some("value"), || {
            assert_eq!(env_or_default("CFG_TEST_VAR", "default"), "value");
        });
        temp_env::with_var_unset("CFG_TEST_VAR", || {
            assert_eq!(env_or_default("CFG_TEST_VAR", "default"), "default");
        });
    }

    #[test]
    fn test_env_required_missing() {
        temp_env::with_var_unset("CFG_MISSING_REQUIRED", || {
            let err = env_required("CFG_MISSING_REQUIRED").unwrap_err();
            assert!(err.to_string().contains("CFG_MISSING_REQUIRED"));
            assert!(err.to_string().contains("required"));
        });
    }

    #[test]
    fn test_env_optional_treats_blank_as_absent() {
        temp_env::with_var("CFG_OPTIONAL", Some("   "), || {
            assert_eq!(env_optional("CFG_OPTIONAL"), None);
        });
        temp_env::with_var("CFG_OPTIONAL", Some(" sk_test "), || {
            assert_eq!(env_optional("CFG_OPTIONAL").as_deref(), Some("sk_test"));
        });
    }

    #[test]
    fn test_env_parse() {
        temp_env::with_var_unset("CFG_TIMEOUT", || {
            assert_eq!(env_parse::<u64>("CFG_TIMEOUT", 15).unwrap(), 15);
        });
        temp_env::with_var("CFG_TIMEOUT", Some("30"), || {
            assert_eq!(env_parse::<u64>("CFG_TIMEOUT", 15).unwrap(), 30);
        });
        temp_env::with_var("CFG_TIMEOUT", Some("soon"), || {
            let err = env_parse::<u64>("CFG_TIMEOUT", 15).unwrap_err();
            assert!(matches!(err, ConfigError::ParseError { ref key, .. } if key == "CFG_TIMEOUT"));
        });
    }

    #[test]
    fn test_env_flag() {
        temp_env::with_var("CFG_FLAG", Some("No"), || {
            assert!(!env_flag("CFG_FLAG", true).unwrap());
        });
        temp_env::with_var_unset("CFG_FLAG", || {
            assert!(env_flag("CFG_FLAG", true).unwrap());
        });
        temp_env::with_var("CFG_FLAG", Some("maybe"), || {
            assert!(env_flag("CFG_FLAG", true).is_err());
        });
    }
}
