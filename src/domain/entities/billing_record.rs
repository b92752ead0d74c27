use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

/// One append-only row per attempted charge or billing adjustment. The
/// engine never mutates or deletes past records.
#[derive(Debug, Clone, Serialize)]
pub struct BillingRecord {
    pub id: Uuid,
    pub subscription_id: Uuid,
    pub end_user_id: Uuid,
    pub amount: Decimal,
    pub currency: String,
    pub description: String,
    /// Gateway transaction reference; absent for adjustments that did not
    /// go through the gateway (plan-change prorations).
    pub transaction_ref: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl BillingRecord {
    pub fn new(
        subscription_id: Uuid,
        end_user_id: Uuid,
        amount: Decimal,
        currency: &str,
        description: &str,
        transaction_ref: Option<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            subscription_id,
            end_user_id,
            amount,
            currency: currency.to_string(),
            description: description.to_string(),
            transaction_ref,
            created_at,
        }
    }
}
