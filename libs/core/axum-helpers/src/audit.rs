//! Audit trail for security-relevant actions.
//!
//! Events go to the `audit` tracing target so log routing can split them out.
//!
//! ```ignore
//! use axum_helpers::audit::{AuditEvent, AuditOutcome};
//!
//! AuditEvent::new("ticket.check_in", AuditOutcome::Denied)
//!     .actor(caller_id)
//!     .resource("ticket", ticket_id)
//!     .from_headers(&headers)
//!     .log();
//! ```

use axum::http::HeaderMap;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt::Display;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditOutcome {
    Success,
    Failure,
    Denied,
}

#[derive(Debug, Serialize)]
pub struct AuditEvent {
    pub action: String,
    pub outcome: AuditOutcome,
    pub user_id: Option<String>,
    /// `kind:id`, e.g. `ticket:0192...`
    pub resource: Option<String>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub details: Option<serde_json::Value>,
}

impl AuditEvent {
    pub fn new(action: impl Into<String>, outcome: AuditOutcome) -> Self {
        Self {
            action: action.into(),
            outcome,
            user_id: None,
            resource: None,
            ip_address: None,
            user_agent: None,
            timestamp: Utc::now(),
            details: None,
        }
    }

    pub fn actor(mut self, user_id: impl Display) -> Self {
        self.user_id = Some(user_id.to_string());
        self
    }

    pub fn resource(mut self, kind: &str, id: impl Display) -> Self {
        self.resource = Some(format!("{kind}:{id}"));
        self
    }

    /// Client IP (proxy headers) and user agent.
    pub fn from_headers(mut self, headers: &HeaderMap) -> Self {
        self.ip_address = extract_ip_from_headers(headers);
        self.user_agent = extract_user_agent(headers);
        self
    }

    pub fn with_details(mut self, details: impl Serialize) -> Self {
        self.details = serde_json::to_value(details).ok();
        self
    }

    pub fn log(self) {
        tracing::info!(
            target: "audit",
            action = %self.action,
            outcome = ?self.outcome,
            user_id = self.user_id.as_deref(),
            resource = self.resource.as_deref(),
            ip = self.ip_address.as_deref(),
            user_agent = self.user_agent.as_deref(),
            details = self.details.as_ref().map(|d| d.to_string()),
            "audit event"
        );
    }
}

/// First hop of `X-Forwarded-For`, else `X-Real-IP`.
pub fn extract_ip_from_headers(headers: &HeaderMap) -> Option<String> {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.split(',').next())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .or_else(|| {
            headers
                .get("x-real-ip")
                .and_then(|v| v.to_str().ok())
                .map(|s| s.trim().to_string())
        })
}

pub fn extract_user_agent(headers: &HeaderMap) -> Option<String> {
    headers
        .get("user-agent")
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
}
