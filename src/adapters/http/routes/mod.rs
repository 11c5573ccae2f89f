pub mod billing;
pub mod customers;
pub mod pauses;
pub mod payments;
pub mod plans;
pub mod subscriptions;

use axum::{Json, Router, extract::State, response::IntoResponse, routing::get};

use crate::{adapters::http::app_state::AppState, app_error::AppResult};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .nest(
            "/customers",
            customers::router()
                .merge(subscriptions::router())
                .merge(pauses::router())
                .merge(billing::customer_router()),
        )
        .nest("/plans", plans::router())
        .nest("/bills", billing::bills_router())
        .nest("/payments", payments::router())
}

/// GET /api/health
async fn health(State(app_state): State<AppState>) -> AppResult<impl IntoResponse> {
    app_state.storage.ping().await?;
    Ok(Json(serde_json::json!({ "status": "ok" })))
}
