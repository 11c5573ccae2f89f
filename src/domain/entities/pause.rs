use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;
use uuid::Uuid;

/// A single day on which the customer skips delivery.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Pause {
    pub customer_id: Uuid,
    pub pause_date: NaiveDate,
    pub created_at: NaiveDateTime,
}
