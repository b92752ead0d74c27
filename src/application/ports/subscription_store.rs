use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
    app_error::AppResult,
    domain::entities::subscription::{Subscription, SubscriptionStatus},
};

/// Result of a conditional subscription write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    Applied,
    /// The stored version no longer matches: another writer advanced the
    /// record first. The caller skips this record for the current cycle.
    Conflict,
}

/// Durable subscription storage port.
#[async_trait]
pub trait SubscriptionStore: Send + Sync {
    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<Subscription>>;

    /// Active subscriptions whose next billing date is at or before `as_of`.
    async fn get_due_for_billing(&self, as_of: DateTime<Utc>) -> AppResult<Vec<Subscription>>;

    /// Active or expired subscriptions whose end date is at or before
    /// `cutoff`, i.e. the renewal candidates.
    async fn get_nearing_expiry(&self, cutoff: DateTime<Utc>) -> AppResult<Vec<Subscription>>;

    async fn get_by_status(&self, status: SubscriptionStatus)
    -> AppResult<Vec<Subscription>>;

    /// Conditional write: applies only while `subscription.version` still
    /// matches the stored row, bumping the version on success.
    async fn update(&self, subscription: &Subscription) -> AppResult<UpdateOutcome>;
}
