use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::app_error::{AppError, AppResult};

use super::billing_cycle::BillingCycle;

/// Third consecutive failed attempt parks the subscription until an
/// operator intervenes.
pub const MAX_FAILED_PAYMENT_ATTEMPTS: i32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "subscription_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    Active,
    PaymentFailed,
    Suspended,
    Expired,
}

impl SubscriptionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionStatus::Active => "active",
            SubscriptionStatus::PaymentFailed => "payment_failed",
            SubscriptionStatus::Suspended => "suspended",
            SubscriptionStatus::Expired => "expired",
        }
    }

    /// Returns true if the engine may charge this subscription without
    /// operator intervention.
    pub fn is_billable(&self) -> bool {
        matches!(
            self,
            SubscriptionStatus::Active | SubscriptionStatus::PaymentFailed
        )
    }
}

/// The central billing entity. Mutated exclusively through the transition
/// methods below, which the orchestrator drives; every mutation is
/// persisted with a conditional write on `version`.
#[derive(Debug, Clone, Serialize)]
pub struct Subscription {
    pub id: Uuid,
    pub end_user_id: Uuid,
    /// Customer/payment-method identifier in the payment gateway.
    pub customer_ref: String,
    pub plan_id: Uuid,
    pub status: SubscriptionStatus,
    pub plan_price: Decimal,
    pub billing_cycle_days: i32,
    pub start_date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
    pub last_billing_date: Option<DateTime<Utc>>,
    pub next_billing_date: DateTime<Utc>,
    pub failed_payment_attempts: i32,
    pub last_payment_error: Option<String>,
    pub last_payment_failed_date: Option<DateTime<Utc>>,
    pub suspended_date: Option<DateTime<Utc>>,
    /// Optimistic-concurrency counter, bumped by the store on every
    /// applied update.
    pub version: i64,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Subscription {
    /// Due once the next billing date is at or before the processing time.
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.next_billing_date <= now
    }

    /// Validated cycle for this record. A non-positive cycle length or a
    /// negative price indicates corrupt billing data; the caller must not
    /// attempt a charge.
    pub fn billing_cycle(&self) -> AppResult<BillingCycle> {
        if self.plan_price < Decimal::ZERO {
            return Err(AppError::InvalidInput(format!(
                "subscription {} has negative plan price {}",
                self.id, self.plan_price
            )));
        }
        BillingCycle::from_days(self.billing_cycle_days)
    }

    /// Successful recurring (or recovered) charge: the cycle re-anchors on
    /// the billing time, failure bookkeeping resets.
    pub fn record_charge_success(&mut self, now: DateTime<Utc>, cycle: BillingCycle) {
        self.status = SubscriptionStatus::Active;
        self.last_billing_date = Some(now);
        self.next_billing_date = cycle.next_billing_date(now);
        self.failed_payment_attempts = 0;
        self.last_payment_error = None;
    }

    /// Successful renewal charge: the end date extends by one cycle and the
    /// billing schedule re-anchors on the previous next billing date.
    pub fn record_renewal_success(&mut self, now: DateTime<Utc>, cycle: BillingCycle) {
        self.status = SubscriptionStatus::Active;
        self.start_date = now;
        self.last_billing_date = Some(now);
        if let Some(end) = self.end_date {
            self.end_date = Some(cycle.next_billing_date(end));
        }
        self.next_billing_date = cycle.next_billing_date(self.next_billing_date);
        self.failed_payment_attempts = 0;
        self.last_payment_error = None;
    }

    /// Failed charge on the recurring or renewal path. The next billing
    /// date stays put: it only advances after a recorded success.
    pub fn record_charge_failure(&mut self, now: DateTime<Utc>, error: String) {
        self.status = SubscriptionStatus::PaymentFailed;
        self.failed_payment_attempts += 1;
        self.last_payment_error = Some(error);
        self.last_payment_failed_date = Some(now);
    }

    /// Failed charge on the retry path. Returns true when this failure hit
    /// the attempt ceiling and suspended the subscription; this is the
    /// sole automatic path into `Suspended`.
    pub fn record_retry_failure(&mut self, now: DateTime<Utc>, error: String) -> bool {
        self.record_charge_failure(now, error);
        if self.failed_payment_attempts >= MAX_FAILED_PAYMENT_ATTEMPTS {
            self.status = SubscriptionStatus::Suspended;
            self.suspended_date = Some(now);
            return true;
        }
        false
    }

    /// Switch to a new plan. Billing status and schedule are untouched;
    /// the new price takes effect from the next charge.
    pub fn change_plan(&mut self, plan_id: Uuid, plan_price: Decimal, billing_cycle_days: i32) {
        self.plan_id = plan_id;
        self.plan_price = plan_price;
        self.billing_cycle_days = billing_cycle_days;
    }
}
