use chrono::NaiveDateTime;
use serde::Serialize;
use uuid::Uuid;

use crate::domain::proration::BillingResult;

/// Monthly bill for one customer. Unique per `(customer_id, month, year)`.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Bill {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub month: i32,
    pub year: i32,
    pub total_days: i32,
    pub paused_days: i32,
    pub billable_days: i32,
    pub amount: i64,
    pub is_paid: bool,
    pub paid_at: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Day counts and amount added to a bill, either as a fresh row or merged
/// into an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BillIncrement {
    pub total_days: i32,
    pub paused_days: i32,
    pub billable_days: i32,
    pub amount: i64,
}

impl BillIncrement {
    pub fn is_empty(&self) -> bool {
        self.total_days == 0
    }
}

impl From<&BillingResult> for BillIncrement {
    fn from(result: &BillingResult) -> Self {
        // Month-sized windows keep day counts far below i32::MAX.
        Self {
            total_days: result.total_days as i32,
            paused_days: result.paused_days as i32,
            billable_days: result.billable_days as i32,
            amount: result.amount,
        }
    }
}

impl Bill {
    /// Bill with `increment` merged in.
    pub fn merged(&self, increment: &BillIncrement) -> Self {
        Self {
            total_days: self.total_days + increment.total_days,
            paused_days: self.paused_days + increment.paused_days,
            billable_days: self.billable_days + increment.billable_days,
            amount: self.amount + increment.amount,
            ..self.clone()
        }
    }
}
