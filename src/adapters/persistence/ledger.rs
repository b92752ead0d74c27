use async_trait::async_trait;

use crate::{
    adapters::persistence::PostgresPersistence,
    app_error::{AppError, AppResult},
    application::ports::ledger::LedgerWriter,
    domain::entities::billing_record::BillingRecord,
};

#[async_trait]
impl LedgerWriter for PostgresPersistence {
    async fn append(&self, record: &BillingRecord) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO billing_records
                (id, subscription_id, end_user_id, amount, currency, description,
                 transaction_ref, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(record.id)
        .bind(record.subscription_id)
        .bind(record.end_user_id)
        .bind(record.amount)
        .bind(&record.currency)
        .bind(&record.description)
        .bind(&record.transaction_ref)
        .bind(record.created_at)
        .execute(self.pool())
        .await
        .map_err(AppError::from)?;
        Ok(())
    }
}
