//! Payment gateway client.
//!
//! [`PaymentGateway`] is the narrow contract settlement needs; [`PaystackGateway`]
//! implements it over the Paystack REST API.

use async_trait::async_trait;
use core_config::{ConfigError, FromEnv, env_optional, env_or_default, env_parse};
use hmac::{Hmac, Mac};
use reqwest::{Client, StatusCode, Url};
use serde::{Deserialize, Serialize};
use serde::de::DeserializeOwned;
use serde_json::Value;
use sha2::Sha512;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_BASE_URL: &str = "https://api.paystack.co";

/// Header carrying the webhook body signature.
pub const SIGNATURE_HEADER: &str = "x-paystack-signature";

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("request timed out")]
    Timeout,

    #[error("gateway rejected the request ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("unusable response: {0}")]
    BadResponse(String),
}

impl GatewayError {
    /// 4xx from the gateway: the request itself was refused.
    pub fn is_client_rejection(&self) -> bool {
        matches!(self, GatewayError::Rejected { status, .. } if (400..500).contains(status))
    }
}

impl From<reqwest::Error> for GatewayError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            GatewayError::Timeout
        } else if err.is_decode() {
            GatewayError::BadResponse(err.to_string())
        } else {
            GatewayError::Transport(err.to_string())
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InitializeTransaction {
    pub email: String,
    /// Minor currency units.
    pub amount: i64,
    pub callback_url: String,
    pub metadata: Value,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InitializedTransaction {
    pub authorization_url: String,
    pub reference: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VerifiedTransaction {
    pub status: String,
    pub amount_minor_units: i64,
    pub payer_email: Option<String>,
    pub metadata: Value,
}

impl VerifiedTransaction {
    pub fn is_success(&self) -> bool {
        self.status == "success"
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn initialize_transaction(
        &self,
        payload: InitializeTransaction,
    ) -> Result<InitializedTransaction, GatewayError>;

    async fn verify_transaction(&self, reference: &str)
    -> Result<VerifiedTransaction, GatewayError>;
}

#[derive(Clone)]
pub struct PaystackConfig {
    /// Unset disables paid RSVPs.
    pub secret_key: Option<String>,
    pub base_url: String,
    pub timeout: Duration,
}

impl std::fmt::Debug for PaystackConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaystackConfig")
            .field("secret_key", &self.secret_key.as_ref().map(|_| "[REDACTED]"))
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl FromEnv for PaystackConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let base_url = env_or_default("PAYSTACK_BASE_URL", DEFAULT_BASE_URL);
        Url::parse(&base_url).map_err(|e| ConfigError::Invalid {
            key: "PAYSTACK_BASE_URL".to_string(),
            details: e.to_string(),
        })?;

        let timeout_secs: u64 = env_parse("GATEWAY_TIMEOUT_SECS", 15)?;
        if timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                key: "GATEWAY_TIMEOUT_SECS".to_string(),
                details: "must be at least 1".to_string(),
            });
        }

        Ok(Self {
            secret_key: env_optional("PAYSTACK_SECRET_KEY"),
            base_url,
            timeout: Duration::from_secs(timeout_secs),
        })
    }
}

/// Paystack's `{ status, message, data }` envelope.
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    status: bool,
    #[serde(default)]
    message: String,
    data: Option<T>,
}

#[derive(Debug, Deserialize)]
struct InitializeData {
    authorization_url: Option<String>,
    reference: Option<String>,
}

#[derive(Debug, Deserialize)]
struct VerifyData {
    status: Option<String>,
    amount: Option<i64>,
    customer: Option<Customer>,
    #[serde(default)]
    metadata: Value,
}

#[derive(Debug, Deserialize)]
struct Customer {
    email: Option<String>,
}

pub struct PaystackGateway {
    client: Client,
    base_url: Url,
    secret_key: String,
}

impl PaystackGateway {
    /// `None` when no secret key is configured.
    pub fn from_config(config: &PaystackConfig) -> Result<Option<Self>, GatewayError> {
        config
            .secret_key
            .as_ref()
            .map(|key| Self::new(key, &config.base_url, config.timeout))
            .transpose()
    }

    pub fn new(secret_key: &str, base_url: &str, timeout: Duration) -> Result<Self, GatewayError> {
        let base_url =
            Url::parse(base_url).map_err(|e| GatewayError::Transport(format!("base url: {e}")))?;
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url,
            secret_key: secret_key.to_string(),
        })
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, GatewayError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| GatewayError::Transport("base url cannot carry a path".to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Sends the request and unwraps the envelope. The raw body of a failed
    /// call is logged here and never returned.
    async fn send<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, GatewayError> {
        let response = request.bearer_auth(&self.secret_key).send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            tracing::warn!(status = %status, body = %body, "Payment gateway returned an error");
            return Err(GatewayError::Rejected {
                status: status.as_u16(),
                message: envelope_message(&body).unwrap_or_else(|| status_text(status)),
            });
        }

        let envelope: Envelope<T> = serde_json::from_str(&body).map_err(|e| {
            tracing::warn!(body = %body, error = %e, "Unparseable payment gateway response");
            GatewayError::BadResponse(e.to_string())
        })?;

        if !envelope.status {
            tracing::warn!(message = %envelope.message, "Payment gateway reported failure");
            return Err(GatewayError::BadResponse(envelope.message));
        }

        envelope
            .data
            .ok_or_else(|| GatewayError::BadResponse("response has no data".to_string()))
    }
}

fn envelope_message(body: &str) -> Option<String> {
    serde_json::from_str::<Envelope<Value>>(body)
        .ok()
        .map(|e| e.message)
        .filter(|m| !m.is_empty())
}

fn status_text(status: StatusCode) -> String {
    status
        .canonical_reason()
        .unwrap_or("unexpected status")
        .to_string()
}

#[async_trait]
impl PaymentGateway for PaystackGateway {
    async fn initialize_transaction(
        &self,
        payload: InitializeTransaction,
    ) -> Result<InitializedTransaction, GatewayError> {
        let url = self.endpoint(&["transaction", "initialize"])?;
        let data: InitializeData = self.send(self.client.post(url).json(&payload)).await?;

        match (data.authorization_url, data.reference) {
            (Some(authorization_url), Some(reference))
                if !authorization_url.is_empty() && !reference.is_empty() =>
            {
                Ok(InitializedTransaction {
                    authorization_url,
                    reference,
                })
            }
            _ => Err(GatewayError::BadResponse(
                "initialize response lacks authorization_url or reference".to_string(),
            )),
        }
    }

    async fn verify_transaction(
        &self,
        reference: &str,
    ) -> Result<VerifiedTransaction, GatewayError> {
        let url = self.endpoint(&["transaction", "verify", reference])?;
        let data: VerifyData = self.send(self.client.get(url)).await?;

        let status = data
            .status
            .ok_or_else(|| GatewayError::BadResponse("verify response lacks status".to_string()))?;

        Ok(VerifiedTransaction {
            status,
            amount_minor_units: data.amount.unwrap_or_default(),
            payer_email: data.customer.and_then(|c| c.email).filter(|e| !e.is_empty()),
            metadata: data.metadata,
        })
    }
}

/// Checks a webhook body against its hex HMAC-SHA512 signature, in constant time.
pub fn verify_webhook_signature(secret: &str, body: &[u8], signature: &str) -> bool {
    let Ok(expected) = hex::decode(signature.trim()) else {
        return false;
    };
    let Ok(mut mac) = Hmac::<Sha512>::new_from_slice(secret.as_bytes()) else {
        return false;
    };
    mac.update(body);
    mac.verify_slice(&expected).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sign(secret: &str, body: &[u8]) -> String {
        let mut mac = Hmac::<Sha512>::new_from_slice(secret.as_bytes()).unwrap();
        mac.update(body);
        hex::encode(mac.finalize().into_bytes())
    }

    #[test]
    fn test_webhook_signature_round_trip() {
        let body = br#"{"event":"charge.success","data":{"reference":"abc"}}"#;
        let signature = sign("sk_test_secret", body);

        assert!(verify_webhook_signature("sk_test_secret", body, &signature));
        assert!(verify_webhook_signature("sk_test_secret", body, &signature.to_uppercase()));
        assert!(!verify_webhook_signature("sk_other", body, &signature));
        assert!(!verify_webhook_signature("sk_test_secret", b"tampered", &signature));
        assert!(!verify_webhook_signature("sk_test_secret", body, "not-hex"));
    }

    #[test]
    fn test_endpoint_encodes_reference() {
        let gateway =
            PaystackGateway::new("sk", "https://api.paystack.co/", Duration::from_secs(1))
                .unwrap();
        let url = gateway.endpoint(&["transaction", "verify", "a/b c"]).unwrap();
        assert_eq!(
            url.as_str(),
            "https://api.paystack.co/transaction/verify/a%2Fb%20c"
        );
    }

    #[test]
    fn test_envelope_parsing() {
        let body = r#"{"status":true,"message":"ok","data":{"status":"success","amount":150000,"customer":{"email":"a@b.c"},"metadata":{"qty":2}}}"#;
        let envelope: Envelope<VerifyData> = serde_json::from_str(body).unwrap();
        let data = envelope.data.unwrap();
        assert_eq!(data.amount, Some(150000));
        assert_eq!(data.customer.and_then(|c| c.email).as_deref(), Some("a@b.c"));

        assert_eq!(
            envelope_message(r#"{"status":false,"message":"Transaction reference not found"}"#)
                .as_deref(),
            Some("Transaction reference not found")
        );
        assert_eq!(envelope_message("<html>"), None);
    }

    #[test]
    fn test_client_rejection() {
        let not_found = GatewayError::Rejected {
            status: 404,
            message: "not found".into(),
        };
        let outage = GatewayError::Rejected {
            status: 503,
            message: "down".into(),
        };
        assert!(not_found.is_client_rejection());
        assert!(!outage.is_client_rejection());
        assert!(!GatewayError::Timeout.is_client_rejection());
    }

    #[test]
    fn test_config_defaults() {
        temp_env::with_vars_unset(
            ["PAYSTACK_SECRET_KEY", "PAYSTACK_BASE_URL", "GATEWAY_TIMEOUT_SECS"],
            || {
                let config = PaystackConfig::from_env().unwrap();
                assert!(config.secret_key.is_none());
                assert_eq!(config.base_url, DEFAULT_BASE_URL);
                assert_eq!(config.timeout, Duration::from_secs(15));
                assert!(PaystackGateway::from_config(&config).unwrap().is_none());
            },
        );
    }

    #[test]
    fn test_config_redacts_secret() {
        temp_env::with_var("PAYSTACK_SECRET_KEY", Some("sk_live_123"), || {
            let config = PaystackConfig::from_env().unwrap();
            assert!(!format!("{config:?}").contains("sk_live_123"));
        });
    }

    #[test]
    fn test_config_rejects_zero_timeout() {
        temp_env::with_var("GATEWAY_TIMEOUT_SECS", Some("0"), || {
            assert!(matches!(
                PaystackConfig::from_env(),
                Err(ConfigError::Invalid { .. })
            ));
        });
    }
}
