use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use crate::app_error::AppResult;

/// The slice of a plan the engine reads when switching a subscription.
/// Plan management itself lives elsewhere.
#[derive(Debug, Clone, Serialize)]
pub struct PlanProfile {
    pub id: Uuid,
    pub code: String,
    pub name: String,
    pub price: Decimal,
    pub billing_cycle_days: i32,
}

/// Read-only plan lookup port.
#[async_trait]
pub trait PlanCatalog: Send + Sync {
    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<PlanProfile>>;
}
