//! Pure billing-date and proration arithmetic.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::domain::entities::billing_cycle::BillingCycle;

/// Next billing date for `cycle` anchored at `anchor`.
pub fn next_billing_date(anchor: DateTime<Utc>, cycle: BillingCycle) -> DateTime<Utc> {
    cycle.next_billing_date(anchor)
}

/// Prorated charge for the remainder of the current cycle.
///
/// Remaining whole days are clamped at zero, so an overdue subscription
/// prorates to nothing. The ratio is capped at one: calendar cycles can
/// span more days than their nominal length (a 31-day month on a 30-day
/// cycle), and a full remaining cycle is worth exactly the plan price.
pub fn prorated_amount(
    plan_price: Decimal,
    cycle: BillingCycle,
    next_billing_date: DateTime<Utc>,
    now: DateTime<Utc>,
) -> Decimal {
    let remaining_days = (next_billing_date - now).num_days().max(0);
    let ratio = (Decimal::from(remaining_days) / Decimal::from(cycle.days())).min(Decimal::ONE);
    (plan_price * ratio).max(Decimal::ZERO)
}
