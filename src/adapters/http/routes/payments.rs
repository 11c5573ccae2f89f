//! Payment gateway webhook.

use axum::{
    Json, Router,
    extract::State,
    http::HeaderMap,
    response::IntoResponse,
    routing::post,
};
use chrono::Utc;
use secrecy::ExposeSecret;
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    adapters::http::app_state::AppState,
    app_error::{AppError, AppResult},
    domain::entities::bill::Bill,
    infra::webhook_signature::{SIGNATURE_HEADER, verify_webhook_signature},
    use_cases::payment::{PaymentConfirmation, PaymentOutcome},
};

pub fn router() -> Router<AppState> {
    Router::new().route("/webhook", post(handle_payment_webhook))
}

#[derive(Serialize)]
#[serde(tag = "status", rename_all = "snake_case", rename_all_fields = "camelCase")]
enum WebhookResponse {
    Duplicate,
    BillPaid { bill: Bill },
    SubscriptionActivated { subscription_id: Uuid, bills: Vec<Bill> },
    /// The event cannot be applied and a retry would not change that.
    Ignored { code: &'static str },
}

/// POST /api/payments/webhook
///
/// Transient failures return 5xx so the gateway retries. Events that can
/// never be applied are acknowledged with 200 and logged.
async fn handle_payment_webhook(
    State(app_state): State<AppState>,
    headers: HeaderMap,
    body: String,
) -> AppResult<impl IntoResponse> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or(AppError::InvalidSignature)?;

    verify_webhook_signature(
        app_state.config.payment_webhook_secret.expose_secret(),
        signature,
        &body,
        Utc::now().timestamp(),
        app_state.config.webhook_tolerance_secs,
    )?;

    let event: PaymentConfirmation = serde_json::from_str(&body)
        .map_err(|e| AppError::InvalidInput(format!("Invalid webhook payload: {}", e)))?;

    let response = match app_state.payment_use_cases.confirm(&event).await {
        Ok(PaymentOutcome::Duplicate) => WebhookResponse::Duplicate,
        Ok(PaymentOutcome::BillPaid(bill)) => WebhookResponse::BillPaid { bill },
        Ok(PaymentOutcome::SubscriptionActivated {
            subscription_id,
            bills,
        }) => WebhookResponse::SubscriptionActivated {
            subscription_id,
            bills,
        },
        Err(e) if e.is_retryable() => return Err(e),
        Err(e) => {
            warn!(
                error = %e,
                reference = %event.external_reference,
                retryable = false,
                "Payment confirmation could not be applied, acknowledging"
            );
            WebhookResponse::Ignored {
                code: e.code().as_str(),
            }
        }
    };

    info!(reference = %event.external_reference, "Payment webhook processed");
    Ok(Json(response))
}
