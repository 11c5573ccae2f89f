use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    adapters::persistence::PostgresPersistence,
    app_error::{AppError, AppResult},
    domain::entities::plan::Plan,
    use_cases::plan::{CreatePlanInput, PlanRepo},
};

const SELECT_COLS: &str = "id, name, description, daily_rate, is_active, created_at";

#[async_trait]
impl PlanRepo for PostgresPersistence {
    async fn create(&self, input: &CreatePlanInput) -> AppResult<Plan> {
        sqlx::query_as::<_, Plan>(&format!(
            "INSERT INTO plans (id, name, description, daily_rate) VALUES ($1, $2, $3, $4) RETURNING {}",
            SELECT_COLS
        ))
        .bind(Uuid::new_v4())
        .bind(&input.name)
        .bind(&input.description)
        .bind(input.daily_rate)
        .fetch_one(self.pool())
        .await
        .map_err(AppError::from)
    }

    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<Plan>> {
        sqlx::query_as::<_, Plan>(&format!("SELECT {} FROM plans WHERE id = $1", SELECT_COLS))
            .bind(id)
            .fetch_optional(self.pool())
            .await
            .map_err(AppError::from)
    }

    async fn list_active(&self) -> AppResult<Vec<Plan>> {
        sqlx::query_as::<_, Plan>(&format!(
            "SELECT {} FROM plans WHERE is_active = true ORDER BY name",
            SELECT_COLS
        ))
        .fetch_all(self.pool())
        .await
        .map_err(AppError::from)
    }

    async fn set_active(&self, id: Uuid, is_active: bool) -> AppResult<Option<Plan>> {
        sqlx::query_as::<_, Plan>(&format!(
            "UPDATE plans SET is_active = $2 WHERE id = $1 RETURNING {}",
            SELECT_COLS
        ))
        .bind(id)
        .bind(is_active)
        .fetch_optional(self.pool())
        .await
        .map_err(AppError::from)
    }
}
