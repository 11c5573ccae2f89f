use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    app_error::{AppError, AppResult},
    domain::entities::plan::Plan,
    validators::is_valid_plan_name,
};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePlanInput {
    pub name: String,
    pub description: Option<String>,
    pub daily_rate: i64,
}

#[async_trait]
pub trait PlanRepo: Send + Sync {
    async fn create(&self, input: &CreatePlanInput) -> AppResult<Plan>;
    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<Plan>>;
    async fn list_active(&self) -> AppResult<Vec<Plan>>;
    async fn set_active(&self, id: Uuid, is_active: bool) -> AppResult<Option<Plan>>;
}

#[derive(Clone)]
pub struct PlanUseCases {
    repo: Arc<dyn PlanRepo>,
}

impl PlanUseCases {
    pub fn new(repo: Arc<dyn PlanRepo>) -> Self {
        Self { repo }
    }

    #[instrument(skip(self, input), fields(name = %input.name))]
    pub async fn create_plan(&self, input: &CreatePlanInput) -> AppResult<Plan> {
        if !is_valid_plan_name(&input.name) {
            return Err(AppError::InvalidInput("Plan name is required".into()));
        }
        if input.daily_rate <= 0 {
            return Err(AppError::InvalidInput(
                "Daily rate must be positive".into(),
            ));
        }

        let input = CreatePlanInput {
            name: input.name.trim().to_string(),
            description: input
                .description
                .as_deref()
                .map(str::trim)
                .filter(|d| !d.is_empty())
                .map(str::to_string),
            daily_rate: input.daily_rate,
        };
        let plan = self.repo.create(&input).await?;
        info!(plan_id = %plan.id, daily_rate = plan.daily_rate, "Plan created");
        Ok(plan)
    }

    pub async fn list_active(&self) -> AppResult<Vec<Plan>> {
        self.repo.list_active().await
    }

    /// Existing subscriptions keep their captured rate; only new
    /// subscriptions are blocked.
    #[instrument(skip(self))]
    pub async fn deactivate(&self, id: Uuid) -> AppResult<Plan> {
        let plan = self
            .repo
            .set_active(id, false)
            .await?
            .ok_or(AppError::NotFound)?;
        info!(plan_id = %plan.id, "Plan deactivated");
        Ok(plan)
    }
}
