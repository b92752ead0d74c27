use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::app_error::AppResult;

pub const PAYMENT_SUCCEEDED: &str = "payment_succeeded";
pub const PAYMENT_FAILED: &str = "payment_failed";
pub const SUBSCRIPTION_SUSPENDED: &str = "subscription_suspended";
pub const SUBSCRIPTION_RENEWED: &str = "subscription_renewed";
pub const PLAN_CHANGED: &str = "plan_changed";

/// Operational visibility event for the audit side channel.
#[derive(Debug, Clone, Serialize)]
pub struct AuditEvent {
    pub subscription_id: Uuid,
    pub event_type: String,
    pub detail: serde_json::Value,
    pub occurred_at: DateTime<Utc>,
}

impl AuditEvent {
    pub fn new(
        subscription_id: Uuid,
        event_type: &str,
        detail: serde_json::Value,
        occurred_at: DateTime<Utc>,
    ) -> Self {
        Self {
            subscription_id,
            event_type: event_type.to_string(),
            detail,
            occurred_at,
        }
    }
}

/// Best-effort notification/audit port. A failing sink must never block
/// billing: callers log the error and move on.
#[async_trait]
pub trait AuditSink: Send + Sync {
    async fn emit(&self, event: AuditEvent) -> AppResult<()>;
}
