use async_trait::async_trait;
use sqlx::Row;
use uuid::Uuid;

use crate::{
    adapters::persistence::PostgresPersistence,
    app_error::{AppError, AppResult},
    application::ports::plan_catalog::{PlanCatalog, PlanProfile},
};

#[async_trait]
impl PlanCatalog for PostgresPersistence {
    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<PlanProfile>> {
        let row = sqlx::query(
            "SELECT id, code, name, price, billing_cycle_days FROM subscription_plans WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(self.pool())
        .await
        .map_err(AppError::from)?;

        Ok(row.map(|row| PlanProfile {
            id: row.get("id"),
            code: row.get("code"),
            name: row.get("name"),
            price: row.get("price"),
            billing_cycle_days: row.get("billing_cycle_days"),
        }))
    }
}
