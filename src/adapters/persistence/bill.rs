use async_trait::async_trait;
use chrono::NaiveDateTime;
use sqlx::PgExecutor;
use uuid::Uuid;

use crate::{
    adapters::persistence::PostgresPersistence,
    app_error::{AppError, AppResult},
    domain::entities::bill::{Bill, BillIncrement},
    use_cases::billing::{BillRepo, NewBill},
};

const SELECT_COLS: &str = r#"
    id, customer_id, month, year, total_days, paused_days, billable_days,
    amount, is_paid, paid_at, created_at, updated_at
"#;

/// Subtracts the increment from the period's bill. Paid state is left as is.
/// Returns `None` when the period has no bill.
pub(super) async fn credit_bill<'e, E: PgExecutor<'e>>(
    executor: E,
    customer_id: Uuid,
    month: i32,
    year: i32,
    increment: &BillIncrement,
    at: NaiveDateTime,
) -> AppResult<Option<Bill>> {
    sqlx::query_as::<_, Bill>(&format!(
        r#"
        UPDATE bills SET
            total_days = total_days - $4,
            paused_days = paused_days - $5,
            billable_days = billable_days - $6,
            amount = amount - $7,
            updated_at = $8
        WHERE customer_id = $1 AND month = $2 AND year = $3
        RETURNING {}
        "#,
        SELECT_COLS
    ))
    .bind(customer_id)
    .bind(month)
    .bind(year)
    .bind(increment.total_days)
    .bind(increment.paused_days)
    .bind(increment.billable_days)
    .bind(increment.amount)
    .bind(at)
    .fetch_optional(executor)
    .await
    .map_err(AppError::from)
}

/// Adds the increment into the period's bill, creating it if absent, and
/// marks it paid. One statement so concurrent merges never lose an update.
pub(super) async fn merge_bill<'e, E: PgExecutor<'e>>(
    executor: E,
    customer_id: Uuid,
    month: i32,
    year: i32,
    increment: &BillIncrement,
    paid_at: NaiveDateTime,
) -> AppResult<Bill> {
    sqlx::query_as::<_, Bill>(&format!(
        r#"
        INSERT INTO bills (
            id, customer_id, month, year, total_days, paused_days, billable_days,
            amount, is_paid, paid_at, created_at, updated_at
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, true, $9, $9, $9)
        ON CONFLICT (customer_id, month, year) DO UPDATE SET
            total_days = bills.total_days + EXCLUDED.total_days,
            paused_days = bills.paused_days + EXCLUDED.paused_days,
            billable_days = bills.billable_days + EXCLUDED.billable_days,
            amount = bills.amount + EXCLUDED.amount,
            is_paid = true,
            paid_at = COALESCE(bills.paid_at, EXCLUDED.paid_at),
            updated_at = EXCLUDED.updated_at
        RETURNING {}
        "#,
        SELECT_COLS
    ))
    .bind(Uuid::new_v4())
    .bind(customer_id)
    .bind(month)
    .bind(year)
    .bind(increment.total_days)
    .bind(increment.paused_days)
    .bind(increment.billable_days)
    .bind(increment.amount)
    .bind(paid_at)
    .fetch_one(executor)
    .await
    .map_err(AppError::from)
}

/// Marks the bill paid unless it already is. `None` when nothing changed.
pub(super) async fn mark_bill_paid<'e, E: PgExecutor<'e>>(
    executor: E,
    id: Uuid,
    paid_at: NaiveDateTime,
) -> AppResult<Option<Bill>> {
    sqlx::query_as::<_, Bill>(&format!(
        r#"
        UPDATE bills SET is_paid = true, paid_at = $2, updated_at = $2
        WHERE id = $1 AND is_paid = false
        RETURNING {}
        "#,
        SELECT_COLS
    ))
    .bind(id)
    .bind(paid_at)
    .fetch_optional(executor)
    .await
    .map_err(AppError::from)
}

pub(super) async fn get_bill<'e, E: PgExecutor<'e>>(executor: E, id: Uuid) -> AppResult<Option<Bill>> {
    sqlx::query_as::<_, Bill>(&format!("SELECT {} FROM bills WHERE id = $1", SELECT_COLS))
        .bind(id)
        .fetch_optional(executor)
        .await
        .map_err(AppError::from)
}

#[async_trait]
impl BillRepo for PostgresPersistence {
    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<Bill>> {
        get_bill(self.pool(), id).await
    }

    async fn get_by_period(
        &self,
        customer_id: Uuid,
        month: i32,
        year: i32,
    ) -> AppResult<Option<Bill>> {
        sqlx::query_as::<_, Bill>(&format!(
            "SELECT {} FROM bills WHERE customer_id = $1 AND month = $2 AND year = $3",
            SELECT_COLS
        ))
        .bind(customer_id)
        .bind(month)
        .bind(year)
        .fetch_optional(self.pool())
        .await
        .map_err(AppError::from)
    }

    async fn insert_if_absent(&self, bill: &NewBill) -> AppResult<Option<Bill>> {
        sqlx::query_as::<_, Bill>(&format!(
            r#"
            INSERT INTO bills (
                id, customer_id, month, year, total_days, paused_days, billable_days, amount
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (customer_id, month, year) DO NOTHING
            RETURNING {}
            "#,
            SELECT_COLS
        ))
        .bind(Uuid::new_v4())
        .bind(bill.customer_id)
        .bind(bill.month)
        .bind(bill.year)
        .bind(bill.increment.total_days)
        .bind(bill.increment.paused_days)
        .bind(bill.increment.billable_days)
        .bind(bill.increment.amount)
        .fetch_optional(self.pool())
        .await
        .map_err(AppError::from)
    }

    async fn list_by_customer(&self, customer_id: Uuid) -> AppResult<Vec<Bill>> {
        sqlx::query_as::<_, Bill>(&format!(
            "SELECT {} FROM bills WHERE customer_id = $1 ORDER BY year DESC, month DESC",
            SELECT_COLS
        ))
        .bind(customer_id)
        .fetch_all(self.pool())
        .await
        .map_err(AppError::from)
    }

    async fn list_unpaid(&self, customer_id: Uuid) -> AppResult<Vec<Bill>> {
        sqlx::query_as::<_, Bill>(&format!(
            r#"
            SELECT {} FROM bills
            WHERE customer_id = $1 AND is_paid = false
            ORDER BY year DESC, month DESC
            "#,
            SELECT_COLS
        ))
        .bind(customer_id)
        .fetch_all(self.pool())
        .await
        .map_err(AppError::from)
    }

    async fn mark_paid(&self, id: Uuid, paid_at: NaiveDateTime) -> AppResult<Option<Bill>> {
        mark_bill_paid(self.pool(), id, paid_at).await
    }

    async fn merge_or_create(
        &self,
        customer_id: Uuid,
        month: i32,
        year: i32,
        increment: &BillIncrement,
        paid_at: NaiveDateTime,
    ) -> AppResult<Bill> {
        merge_bill(self.pool(), customer_id, month, year, increment, paid_at).await
    }
}
