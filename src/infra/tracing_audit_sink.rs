use async_trait::async_trait;
use tracing::info;

use crate::{
    app_error::AppResult,
    application::ports::audit_sink::{AuditEvent, AuditSink},
};

/// Audit sink backed by structured logging. Billing never depends on it
/// succeeding, so a log line is a reasonable default transport.
pub struct TracingAuditSink;

#[async_trait]
impl AuditSink for TracingAuditSink {
    async fn emit(&self, event: AuditEvent) -> AppResult<()> {
        info!(
            subscription_id = %event.subscription_id,
            event_type = %event.event_type,
            detail = %event.detail,
            occurred_at = %event.occurred_at,
            "Billing audit event"
        );
        Ok(())
    }
}
