use axum::{
    Json, Router,
    extract::{Path, Query, State},
    response::IntoResponse,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    adapters::http::{app_state::AppState, routes::pauses::RangeQuery},
    app_error::AppResult,
    domain::entities::bill::Bill,
    use_cases::billing::GenerateOutcome,
};

/// Routes under `/customers`.
pub fn customer_router() -> Router<AppState> {
    Router::new()
        .route("/{customer_id}/billing", get(compute_billing))
        .route("/{customer_id}/billing/estimate", get(estimate_billing))
        .route("/{customer_id}/bills", get(list_bills))
}

/// Routes under `/bills`.
pub fn bills_router() -> Router<AppState> {
    Router::new()
        .route("/generate", post(generate_bills))
        .route("/{bill_id}", get(get_bill))
        .route("/{bill_id}/paid", post(mark_bill_paid))
}

#[derive(Deserialize)]
struct BillsQuery {
    #[serde(default)]
    unpaid: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateBillsPayload {
    month: u32,
    year: i32,
    /// Generate for one customer only instead of the whole month's batch.
    customer_id: Option<Uuid>,
}

#[derive(Serialize)]
#[serde(rename_all = "snake_case")]
enum GenerateStatus {
    Created,
    AlreadyExists,
    NothingToBill,
}

#[derive(Serialize)]
struct GenerateOneResponse {
    status: GenerateStatus,
    bill: Option<Bill>,
}

/// GET /api/customers/{customer_id}/billing?from=YYYY-MM-DD&to=YYYY-MM-DD
async fn compute_billing(
    State(app_state): State<AppState>,
    Path(customer_id): Path<Uuid>,
    Query(query): Query<RangeQuery>,
) -> AppResult<impl IntoResponse> {
    let result = app_state
        .billing_use_cases
        .compute_for_window(customer_id, query.range()?)
        .await?;
    Ok(Json(result))
}

/// GET /api/customers/{customer_id}/billing/estimate
/// Live estimate for the current month.
async fn estimate_billing(
    State(app_state): State<AppState>,
    Path(customer_id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    let result = app_state
        .billing_use_cases
        .estimate_current_month(customer_id)
        .await?;
    Ok(Json(result))
}

/// GET /api/customers/{customer_id}/bills[?unpaid=true]
async fn list_bills(
    State(app_state): State<AppState>,
    Path(customer_id): Path<Uuid>,
    Query(query): Query<BillsQuery>,
) -> AppResult<impl IntoResponse> {
    let bills = if query.unpaid {
        app_state.billing_use_cases.get_unpaid(customer_id).await?
    } else {
        app_state.billing_use_cases.list_bills(customer_id).await?
    };
    Ok(Json(bills))
}

/// POST /api/bills/generate
async fn generate_bills(
    State(app_state): State<AppState>,
    Json(payload): Json<GenerateBillsPayload>,
) -> AppResult<axum::response::Response> {
    let billing = &app_state.billing_use_cases;
    let Some(customer_id) = payload.customer_id else {
        let summary = billing
            .generate_for_period(payload.month, payload.year)
            .await?;
        return Ok(Json(summary).into_response());
    };

    let response = match billing
        .generate(customer_id, payload.month, payload.year)
        .await?
    {
        GenerateOutcome::Created(bill) => GenerateOneResponse {
            status: GenerateStatus::Created,
            bill: Some(bill),
        },
        GenerateOutcome::AlreadyExists(bill) => GenerateOneResponse {
            status: GenerateStatus::AlreadyExists,
            bill: Some(bill),
        },
        GenerateOutcome::NothingToBill => GenerateOneResponse {
            status: GenerateStatus::NothingToBill,
            bill: None,
        },
    };
    Ok(Json(response).into_response())
}

/// GET /api/bills/{bill_id}
async fn get_bill(
    State(app_state): State<AppState>,
    Path(bill_id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    let bill = app_state.billing_use_cases.get_bill(bill_id).await?;
    Ok(Json(bill))
}

/// POST /api/bills/{bill_id}/paid
async fn mark_bill_paid(
    State(app_state): State<AppState>,
    Path(bill_id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    let bill = app_state.billing_use_cases.mark_paid(bill_id).await?;
    Ok(Json(bill))
}
