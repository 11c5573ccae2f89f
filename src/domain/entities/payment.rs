use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// What a confirmed payment settles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "payment_purpose", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PaymentPurpose {
    Bill,
    Subscription,
}

impl PaymentPurpose {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentPurpose::Bill => "bill",
            PaymentPurpose::Subscription => "subscription",
        }
    }
}

/// A payment confirmation received from the gateway. `external_reference` is
/// unique; a second confirmation with the same reference is ignored.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    pub id: Uuid,
    pub external_reference: String,
    pub customer_id: Uuid,
    pub amount: i64,
    pub purpose: PaymentPurpose,
    pub bill_id: Option<Uuid>,
    pub subscription_id: Option<Uuid>,
    pub received_at: NaiveDateTime,
}
