use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::Row;
use uuid::Uuid;

use crate::{
    adapters::persistence::PostgresPersistence,
    app_error::{AppError, AppResult},
    domain::{calendar::DateRange, entities::pause::Pause},
    use_cases::pause::PauseRepo,
};

fn row_to_pause(row: sqlx::postgres::PgRow) -> Pause {
    Pause {
        customer_id: row.get("customer_id"),
        pause_date: row.get("pause_date"),
        created_at: row.get("created_at"),
    }
}

#[async_trait]
impl PauseRepo for PostgresPersistence {
    async fn insert(&self, customer_id: Uuid, date: NaiveDate) -> AppResult<Pause> {
        // The unique (customer_id, pause_date) key settles concurrent inserts.
        let row = sqlx::query(
            r#"
            INSERT INTO pauses (customer_id, pause_date)
            VALUES ($1, $2)
            ON CONFLICT (customer_id, pause_date) DO NOTHING
            RETURNING customer_id, pause_date, created_at
            "#,
        )
        .bind(customer_id)
        .bind(date)
        .fetch_optional(self.pool())
        .await
        .map_err(AppError::from)?;
        row.map(row_to_pause).ok_or(AppError::DuplicatePause)
    }

    async fn delete(&self, customer_id: Uuid, date: NaiveDate) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM pauses WHERE customer_id = $1 AND pause_date = $2")
            .bind(customer_id)
            .bind(date)
            .execute(self.pool())
            .await
            .map_err(AppError::from)?;
        Ok(result.rows_affected() > 0)
    }

    async fn exists(&self, customer_id: Uuid, date: NaiveDate) -> AppResult<bool> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM pauses WHERE customer_id = $1 AND pause_date = $2)",
        )
        .bind(customer_id)
        .bind(date)
        .fetch_one(self.pool())
        .await
        .map_err(AppError::from)
    }

    async fn count_in_range(&self, customer_id: Uuid, range: DateRange) -> AppResult<i64> {
        sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM pauses WHERE customer_id = $1 AND pause_date BETWEEN $2 AND $3",
        )
        .bind(customer_id)
        .bind(range.start())
        .bind(range.end())
        .fetch_one(self.pool())
        .await
        .map_err(AppError::from)
    }

    async fn list_in_range(&self, customer_id: Uuid, range: DateRange) -> AppResult<Vec<Pause>> {
        let rows = sqlx::query(
            r#"
            SELECT customer_id, pause_date, created_at FROM pauses
            WHERE customer_id = $1 AND pause_date BETWEEN $2 AND $3
            ORDER BY pause_date
            "#,
        )
        .bind(customer_id)
        .bind(range.start())
        .bind(range.end())
        .fetch_all(self.pool())
        .await
        .map_err(AppError::from)?;
        Ok(rows.into_iter().map(row_to_pause).collect())
    }
}
