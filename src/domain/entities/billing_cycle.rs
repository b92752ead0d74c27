use chrono::{DateTime, Duration, Months, Utc};

use crate::app_error::{AppError, AppResult};

/// Validated billing cadence in days.
///
/// Known cadences advance on calendar boundaries rather than literal day
/// counts: a monthly plan anchored on the 31st must land on a valid
/// next-month date, not 30 * 24h later.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BillingCycle {
    days: i32,
}

impl BillingCycle {
    /// A non-positive cycle length is a data-integrity bug, not a runtime
    /// condition; it never reaches the gateway.
    pub fn from_days(days: i32) -> AppResult<Self> {
        if days <= 0 {
            return Err(AppError::InvalidBillingCycle(format!(
                "cycle length must be positive, got {days}"
            )));
        }
        Ok(Self { days })
    }

    pub fn days(&self) -> i32 {
        self.days
    }

    /// Next billing date for this cycle anchored at `anchor`.
    ///
    /// 1/7/30/90/365-day cycles map to +1 day / +1 week / +1 month /
    /// +3 months / +1 year (chrono clamps Jan 31 + 1 month to the end of
    /// February); any other length advances by the literal day count.
    pub fn next_billing_date(&self, anchor: DateTime<Utc>) -> DateTime<Utc> {
        match self.days {
            1 => anchor + Duration::days(1),
            7 => anchor + Duration::weeks(1),
            30 => anchor
                .checked_add_months(Months::new(1))
                .unwrap_or_else(|| anchor + Duration::days(30)),
            90 => anchor
                .checked_add_months(Months::new(3))
                .unwrap_or_else(|| anchor + Duration::days(90)),
            365 => anchor
                .checked_add_months(Months::new(12))
                .unwrap_or_else(|| anchor + Duration::days(365)),
            n => anchor + Duration::days(i64::from(n)),
        }
    }
}
