use chrono::NaiveDateTime;
use serde::Serialize;
use uuid::Uuid;

/// A meal plan offered to customers. `daily_rate` is in whole currency units.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Plan {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub daily_rate: i64,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
}
