use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::Row;
use uuid::Uuid;

use crate::{
    adapters::persistence::PostgresPersistence,
    app_error::{AppError, AppResult},
    application::ports::subscription_store::{SubscriptionStore, UpdateOutcome},
    domain::entities::subscription::{Subscription, SubscriptionStatus},
};

fn row_to_subscription(row: &sqlx::postgres::PgRow) -> Subscription {
    Subscription {
        id: row.get("id"),
        end_user_id: row.get("end_user_id"),
        customer_ref: row.get("customer_ref"),
        plan_id: row.get("plan_id"),
        status: row.get("status"),
        plan_price: row.get("plan_price"),
        billing_cycle_days: row.get("billing_cycle_days"),
        start_date: row.get("start_date"),
        end_date: row.get("end_date"),
        last_billing_date: row.get("last_billing_date"),
        next_billing_date: row.get("next_billing_date"),
        failed_payment_attempts: row.get("failed_payment_attempts"),
        last_payment_error: row.get("last_payment_error"),
        last_payment_failed_date: row.get("last_payment_failed_date"),
        suspended_date: row.get("suspended_date"),
        version: row.get("version"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

const SELECT_COLS: &str = r#"
    id, end_user_id, customer_ref, plan_id, status, plan_price, billing_cycle_days,
    start_date, end_date, last_billing_date, next_billing_date,
    failed_payment_attempts, last_payment_error, last_payment_failed_date,
    suspended_date, version, created_at, updated_at
"#;

#[async_trait]
impl SubscriptionStore for PostgresPersistence {
    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<Subscription>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM subscriptions WHERE id = $1",
            SELECT_COLS
        ))
        .bind(id)
        .fetch_optional(self.pool())
        .await
        .map_err(AppError::from)?;
        Ok(row.as_ref().map(row_to_subscription))
    }

    async fn get_due_for_billing(&self, as_of: DateTime<Utc>) -> AppResult<Vec<Subscription>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM subscriptions WHERE status = 'active' AND next_billing_date <= $1 ORDER BY next_billing_date",
            SELECT_COLS
        ))
        .bind(as_of)
        .fetch_all(self.pool())
        .await
        .map_err(AppError::from)?;
        Ok(rows.iter().map(row_to_subscription).collect())
    }

    async fn get_nearing_expiry(&self, cutoff: DateTime<Utc>) -> AppResult<Vec<Subscription>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM subscriptions WHERE status IN ('active', 'expired') AND end_date IS NOT NULL AND end_date <= $1 ORDER BY end_date",
            SELECT_COLS
        ))
        .bind(cutoff)
        .fetch_all(self.pool())
        .await
        .map_err(AppError::from)?;
        Ok(rows.iter().map(row_to_subscription).collect())
    }

    async fn get_by_status(
        &self,
        status: SubscriptionStatus,
    ) -> AppResult<Vec<Subscription>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM subscriptions WHERE status = $1 ORDER BY next_billing_date",
            SELECT_COLS
        ))
        .bind(status)
        .fetch_all(self.pool())
        .await
        .map_err(AppError::from)?;
        Ok(rows.iter().map(row_to_subscription).collect())
    }

    async fn update(&self, subscription: &Subscription) -> AppResult<UpdateOutcome> {
        // Conditional write: zero rows affected means another writer
        // advanced the record first (or it vanished); either way the
        // caller loses the race and skips.
        let result = sqlx::query(
            r#"
            UPDATE subscriptions SET
                plan_id = $2,
                status = $3,
                plan_price = $4,
                billing_cycle_days = $5,
                start_date = $6,
                end_date = $7,
                last_billing_date = $8,
                next_billing_date = $9,
                failed_payment_attempts = $10,
                last_payment_error = $11,
                last_payment_failed_date = $12,
                suspended_date = $13,
                version = version + 1,
                updated_at = CURRENT_TIMESTAMP
            WHERE id = $1 AND version = $14
            "#,
        )
        .bind(subscription.id)
        .bind(subscription.plan_id)
        .bind(subscription.status)
        .bind(subscription.plan_price)
        .bind(subscription.billing_cycle_days)
        .bind(subscription.start_date)
        .bind(subscription.end_date)
        .bind(subscription.last_billing_date)
        .bind(subscription.next_billing_date)
        .bind(subscription.failed_payment_attempts)
        .bind(&subscription.last_payment_error)
        .bind(subscription.last_payment_failed_date)
        .bind(subscription.suspended_date)
        .bind(subscription.version)
        .execute(self.pool())
        .await
        .map_err(AppError::from)?;

        if result.rows_affected() == 0 {
            Ok(UpdateOutcome::Conflict)
        } else {
            Ok(UpdateOutcome::Applied)
        }
    }
}
