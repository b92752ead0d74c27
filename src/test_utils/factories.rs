//! Entity factories for tests.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{
    application::ports::plan_catalog::PlanProfile,
    domain::entities::subscription::{Subscription, SubscriptionStatus},
};

/// Plan id every factory-built subscription starts on.
pub const DEFAULT_PLAN_ID: &str = "6f8df6a2-54d8-4a38-9e1c-6b8b5890e201";

pub fn active_subscription(
    plan_price: Decimal,
    billing_cycle_days: i32,
    next_billing_date: DateTime<Utc>,
) -> Subscription {
    let created = next_billing_date - chrono::Duration::days(i64::from(billing_cycle_days.max(1)));
    Subscription {
        id: Uuid::new_v4(),
        end_user_id: Uuid::new_v4(),
        customer_ref: format!("cus_{}", Uuid::new_v4()),
        plan_id: DEFAULT_PLAN_ID.parse().unwrap(),
        status: SubscriptionStatus::Active,
        plan_price,
        billing_cycle_days,
        start_date: created,
        end_date: None,
        last_billing_date: None,
        next_billing_date,
        failed_payment_attempts: 0,
        last_payment_error: None,
        last_payment_failed_date: None,
        suspended_date: None,
        version: 1,
        created_at: Some(created),
        updated_at: Some(created),
    }
}

pub fn plan(code: &str, price: Decimal, billing_cycle_days: i32) -> PlanProfile {
    PlanProfile {
        id: Uuid::new_v4(),
        code: code.to_string(),
        name: code.to_string(),
        price,
        billing_cycle_days,
    }
}
