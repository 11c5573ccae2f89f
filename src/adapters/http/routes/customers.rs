use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use uuid::Uuid;

use crate::{
    adapters::http::app_state::AppState, app_error::AppResult,
    use_cases::customer::RegisterCustomerInput,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(register_customer))
        .route("/{customer_id}", get(get_customer))
}

/// POST /api/customers
async fn register_customer(
    State(app_state): State<AppState>,
    Json(payload): Json<RegisterCustomerInput>,
) -> AppResult<impl IntoResponse> {
    let customer = app_state.customer_use_cases.register(&payload).await?;
    Ok((StatusCode::CREATED, Json(customer)))
}

/// GET /api/customers/{customer_id}
async fn get_customer(
    State(app_state): State<AppState>,
    Path(customer_id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    let customer = app_state.customer_use_cases.get(customer_id).await?;
    Ok(Json(customer))
}
