use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::app_error::AppResult;

/// One charge request against the gateway.
///
/// The idempotency key ties the request to a specific subscription cycle,
/// so an ambiguous outcome (timeout) retried later cannot double-bill at
/// the gateway.
#[derive(Debug, Clone, Serialize)]
pub struct ChargeRequest {
    pub customer_ref: String,
    pub amount: Decimal,
    pub currency: String,
    pub idempotency_key: String,
}

/// Gateway verdict for a resolved charge call. Transport-level problems
/// (connection refused, malformed response) surface as `Err` instead; both
/// non-approved shapes drive the failure path.
#[derive(Debug, Clone)]
pub enum ChargeOutcome {
    Approved { transaction_ref: String },
    Declined { reason: String },
}

/// Payment gateway port: a synchronous charge call that must resolve or
/// time out. The caller supplies the timeout.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn charge(&self, request: &ChargeRequest) -> AppResult<ChargeOutcome>;
}
