use async_trait::async_trait;
use chrono::NaiveDate;
use uuid::Uuid;

use crate::{
    adapters::persistence::PostgresPersistence,
    app_error::{AppError, AppResult},
    domain::{
        calendar::DateRange,
        entities::subscription::{Subscription, SubscriptionStatus},
    },
    use_cases::subscription::{CreateSubscriptionInput, SubscriptionRepo},
};

const SELECT_COLS: &str = r#"
    id, customer_id, plan_id, start_date, end_date, daily_rate,
    status, replaces_existing, created_at
"#;

/// Active and expired subscriptions are charged for. Keep in sync with
/// `SubscriptionStatus::is_billable`.
const BILLABLE_FILTER: &str = "status IN ('active', 'expired')";

#[async_trait]
impl SubscriptionRepo for PostgresPersistence {
    async fn create(&self, input: &CreateSubscriptionInput) -> AppResult<Subscription> {
        sqlx::query_as::<_, Subscription>(&format!(
            r#"
            INSERT INTO subscriptions (
                id, customer_id, plan_id, start_date, end_date, daily_rate, status, replaces_existing
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {}
            "#,
            SELECT_COLS
        ))
        .bind(Uuid::new_v4())
        .bind(input.customer_id)
        .bind(input.plan_id)
        .bind(input.start_date)
        .bind(input.end_date)
        .bind(input.daily_rate)
        .bind(SubscriptionStatus::PendingPayment)
        .bind(input.replaces_existing)
        .fetch_one(self.pool())
        .await
        .map_err(AppError::from)
    }

    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<Subscription>> {
        sqlx::query_as::<_, Subscription>(&format!(
            "SELECT {} FROM subscriptions WHERE id = $1",
            SELECT_COLS
        ))
        .bind(id)
        .fetch_optional(self.pool())
        .await
        .map_err(AppError::from)
    }

    async fn list_by_customer(&self, customer_id: Uuid) -> AppResult<Vec<Subscription>> {
        sqlx::query_as::<_, Subscription>(&format!(
            "SELECT {} FROM subscriptions WHERE customer_id = $1 ORDER BY start_date, id",
            SELECT_COLS
        ))
        .bind(customer_id)
        .fetch_all(self.pool())
        .await
        .map_err(AppError::from)
    }

    async fn list_billable_in_range(
        &self,
        customer_id: Uuid,
        range: DateRange,
    ) -> AppResult<Vec<Subscription>> {
        sqlx::query_as::<_, Subscription>(&format!(
            r#"
            SELECT {} FROM subscriptions
            WHERE customer_id = $1
              AND {}
              AND start_date <= $3
              AND end_date >= $2
            "#,
            SELECT_COLS, BILLABLE_FILTER
        ))
        .bind(customer_id)
        .bind(range.start())
        .bind(range.end())
        .fetch_all(self.pool())
        .await
        .map_err(AppError::from)
    }

    async fn list_customers_billable_in_range(&self, range: DateRange) -> AppResult<Vec<Uuid>> {
        sqlx::query_scalar::<_, Uuid>(&format!(
            r#"
            SELECT DISTINCT customer_id FROM subscriptions
            WHERE {}
              AND start_date <= $2
              AND end_date >= $1
            ORDER BY customer_id
            "#,
            BILLABLE_FILTER
        ))
        .bind(range.start())
        .bind(range.end())
        .fetch_all(self.pool())
        .await
        .map_err(AppError::from)
    }

    async fn delete(&self, id: Uuid) -> AppResult<()> {
        sqlx::query("DELETE FROM subscriptions WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await
            .map_err(AppError::from)?;
        Ok(())
    }

    async fn expire_ended_before(&self, date: NaiveDate) -> AppResult<u64> {
        let result = sqlx::query(
            "UPDATE subscriptions SET status = $1 WHERE status = $2 AND end_date < $3",
        )
        .bind(SubscriptionStatus::Expired)
        .bind(SubscriptionStatus::Active)
        .bind(date)
        .execute(self.pool())
        .await
        .map_err(AppError::from)?;
        Ok(result.rows_affected())
    }
}
