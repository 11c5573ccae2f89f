use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    adapters::persistence::PostgresPersistence,
    app_error::{AppError, AppResult},
    domain::entities::customer::Customer,
    use_cases::customer::{CustomerRepo, RegisterCustomerInput},
};

const SELECT_COLS: &str = "id, full_name, email, phone, created_at";

#[async_trait]
impl CustomerRepo for PostgresPersistence {
    async fn create(&self, input: &RegisterCustomerInput) -> AppResult<Customer> {
        sqlx::query_as::<_, Customer>(&format!(
            "INSERT INTO customers (id, full_name, email, phone) VALUES ($1, $2, $3, $4) RETURNING {}",
            SELECT_COLS
        ))
        .bind(Uuid::new_v4())
        .bind(&input.full_name)
        .bind(&input.email)
        .bind(&input.phone)
        .fetch_one(self.pool())
        .await
        .map_err(|e| match AppError::from(e) {
            AppError::Conflict(_) => AppError::Conflict("Email is already registered".into()),
            other => other,
        })
    }

    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<Customer>> {
        sqlx::query_as::<_, Customer>(&format!(
            "SELECT {} FROM customers WHERE id = $1",
            SELECT_COLS
        ))
        .bind(id)
        .fetch_optional(self.pool())
        .await
        .map_err(AppError::from)
    }

    async fn get_by_email(&self, email: &str) -> AppResult<Option<Customer>> {
        sqlx::query_as::<_, Customer>(&format!(
            "SELECT {} FROM customers WHERE email = $1",
            SELECT_COLS
        ))
        .bind(email)
        .fetch_optional(self.pool())
        .await
        .map_err(AppError::from)
    }
}
