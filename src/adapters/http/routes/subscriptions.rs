use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get},
};
use uuid::Uuid;

use crate::{
    adapters::http::app_state::AppState, app_error::AppResult,
    use_cases::subscription::SubscribeInput,
};

/// Routes under `/customers`.
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/{customer_id}/subscriptions",
            get(list_subscriptions).post(subscribe),
        )
        .route(
            "/{customer_id}/subscriptions/{subscription_id}",
            delete(cancel_subscription),
        )
}

/// GET /api/customers/{customer_id}/subscriptions
async fn list_subscriptions(
    State(app_state): State<AppState>,
    Path(customer_id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    let subscriptions = app_state.subscription_use_cases.list(customer_id).await?;
    Ok(Json(subscriptions))
}

/// POST /api/customers/{customer_id}/subscriptions
/// Creates a subscription awaiting payment.
async fn subscribe(
    State(app_state): State<AppState>,
    Path(customer_id): Path<Uuid>,
    Json(payload): Json<SubscribeInput>,
) -> AppResult<impl IntoResponse> {
    let subscription = app_state
        .subscription_use_cases
        .subscribe(customer_id, &payload)
        .await?;
    Ok((StatusCode::CREATED, Json(subscription)))
}

/// DELETE /api/customers/{customer_id}/subscriptions/{subscription_id}
async fn cancel_subscription(
    State(app_state): State<AppState>,
    Path((customer_id, subscription_id)): Path<(Uuid, Uuid)>,
) -> AppResult<impl IntoResponse> {
    app_state
        .subscription_use_cases
        .cancel(customer_id, subscription_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
