use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get},
};
use uuid::Uuid;

use crate::{
    adapters::http::app_state::AppState, app_error::AppResult, use_cases::plan::CreatePlanInput,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_plans).post(create_plan))
        .route("/{plan_id}", delete(deactivate_plan))
}

/// GET /api/plans
async fn list_plans(State(app_state): State<AppState>) -> AppResult<impl IntoResponse> {
    let plans = app_state.plan_use_cases.list_active().await?;
    Ok(Json(plans))
}

/// POST /api/plans
async fn create_plan(
    State(app_state): State<AppState>,
    Json(payload): Json<CreatePlanInput>,
) -> AppResult<impl IntoResponse> {
    let plan = app_state.plan_use_cases.create_plan(&payload).await?;
    Ok((StatusCode::CREATED, Json(plan)))
}

/// DELETE /api/plans/{plan_id}
/// Retires the plan for new subscriptions.
async fn deactivate_plan(
    State(app_state): State<AppState>,
    Path(plan_id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    let plan = app_state.plan_use_cases.deactivate(plan_id).await?;
    Ok(Json(plan))
}
