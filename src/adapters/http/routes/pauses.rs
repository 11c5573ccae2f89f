use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    adapters::http::app_state::AppState,
    app_error::AppResult,
    domain::{calendar::DateRange, entities::pause::Pause},
};

/// Routes under `/customers`.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/{customer_id}/pauses", get(list_pauses))
        .route(
            "/{customer_id}/pauses/{date}",
            get(get_pause).post(add_pause).delete(remove_pause),
        )
}

#[derive(Deserialize)]
pub(super) struct RangeQuery {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl RangeQuery {
    pub(super) fn range(&self) -> AppResult<DateRange> {
        Ok(DateRange::new(self.from, self.to)?)
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PauseListResponse {
    from: NaiveDate,
    to: NaiveDate,
    count: i64,
    pauses: Vec<Pause>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PauseStatusResponse {
    date: NaiveDate,
    paused: bool,
}

/// GET /api/customers/{customer_id}/pauses?from=YYYY-MM-DD&to=YYYY-MM-DD
async fn list_pauses(
    State(app_state): State<AppState>,
    Path(customer_id): Path<Uuid>,
    Query(query): Query<RangeQuery>,
) -> AppResult<impl IntoResponse> {
    let range = query.range()?;
    let pauses = app_state
        .pause_use_cases
        .list_pauses(customer_id, range)
        .await?;
    let count = app_state
        .pause_use_cases
        .count_paused(customer_id, range)
        .await?;
    Ok(Json(PauseListResponse {
        from: range.start(),
        to: range.end(),
        count,
        pauses,
    }))
}

/// GET /api/customers/{customer_id}/pauses/{date}
async fn get_pause(
    State(app_state): State<AppState>,
    Path((customer_id, date)): Path<(Uuid, NaiveDate)>,
) -> AppResult<impl IntoResponse> {
    let paused = app_state.pause_use_cases.is_paused(customer_id, date).await?;
    Ok(Json(PauseStatusResponse { date, paused }))
}

/// POST /api/customers/{customer_id}/pauses/{date}
async fn add_pause(
    State(app_state): State<AppState>,
    Path((customer_id, date)): Path<(Uuid, NaiveDate)>,
) -> AppResult<impl IntoResponse> {
    let pause = app_state.pause_use_cases.add_pause(customer_id, date).await?;
    Ok((StatusCode::CREATED, Json(pause)))
}

/// DELETE /api/customers/{customer_id}/pauses/{date}
async fn remove_pause(
    State(app_state): State<AppState>,
    Path((customer_id, date)): Path<(Uuid, NaiveDate)>,
) -> AppResult<impl IntoResponse> {
    app_state
        .pause_use_cases
        .remove_pause(customer_id, date)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
