use async_trait::async_trait;

use crate::{app_error::AppResult, domain::entities::billing_record::BillingRecord};

/// Append-only billing ledger port: one row per attempted charge or
/// adjustment, never mutated afterwards.
#[async_trait]
pub trait LedgerWriter: Send + Sync {
    async fn append(&self, record: &BillingRecord) -> AppResult<()>;
}
