use core_config::{ConfigError, FromEnv, env_required};

const MIN_SECRET_LEN: usize = 32;

/// Secret shared with the identity service that issues access tokens.
///
/// - `JWT_SECRET` (required, at least 32 characters)
#[derive(Clone)]
pub struct JwtConfig {
    pub secret: String,
}

impl JwtConfig {
    pub fn new(secret: impl Into<String>) -> Result<Self, ConfigError> {
        let secret = secret.into();
        if secret.len() < MIN_SECRET_LEN {
            return Err(ConfigError::Invalid {
                key: "JWT_SECRET".to_string(),
                details: format!(
                    "must be at least {MIN_SECRET_LEN} characters (got {}). Generate one with: openssl rand -base64 32",
                    secret.len()
                ),
            });
        }
        Ok(Self { secret })
    }
}

impl std::fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtConfig")
            .field("secret", &"<redacted>")
            .finish()
    }
}

impl FromEnv for JwtConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Self::new(env_required("JWT_SECRET")?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "this-is-a-valid-secret-with-32-chars!";

    #[test]
    fn test_jwt_config_new_too_short() {
        let err = JwtConfig::new("short").unwrap_err();
        assert!(err.to_string().contains("32 characters"));
    }

    #[test]
    fn test_jwt_config_from_env_valid() {
        temp_env::with_var("JWT_SECRET", Some(SECRET), || {
            assert_eq!(JwtConfig::from_env().unwrap().secret, SECRET);
        });
    }

    #[test]
    fn test_jwt_config_from_env_missing() {
        temp_env::with_var_unset("JWT_SECRET", || {
            let err = JwtConfig::from_env().unwrap_err();
            assert!(err.to_string().contains("JWT_SECRET"));
        });
    }

    #[test]
    fn test_debug_redacts_secret() {
        let config = JwtConfig::new(SECRET).unwrap();
        assert!(!format!("{config:?}").contains(SECRET));
    }
}
