use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    app_error::{AppError, AppResult},
    domain::entities::customer::Customer,
    validators::{is_valid_email, is_valid_full_name, is_valid_phone},
};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterCustomerInput {
    pub full_name: String,
    pub email: String,
    pub phone: String,
}

#[async_trait]
pub trait CustomerRepo: Send + Sync {
    async fn create(&self, input: &RegisterCustomerInput) -> AppResult<Customer>;
    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<Customer>>;
    async fn get_by_email(&self, email: &str) -> AppResult<Option<Customer>>;
}

#[derive(Clone)]
pub struct CustomerUseCases {
    repo: Arc<dyn CustomerRepo>,
}

impl CustomerUseCases {
    pub fn new(repo: Arc<dyn CustomerRepo>) -> Self {
        Self { repo }
    }

    #[instrument(skip(self, input), fields(email = %input.email))]
    pub async fn register(&self, input: &RegisterCustomerInput) -> AppResult<Customer> {
        let normalized = RegisterCustomerInput {
            full_name: input.full_name.trim().to_string(),
            email: input.email.trim().to_lowercase(),
            phone: input.phone.trim().to_string(),
        };

        if !is_valid_full_name(&normalized.full_name) {
            return Err(AppError::InvalidInput(
                "Name must be at least 3 characters".into(),
            ));
        }
        if !is_valid_email(&normalized.email) {
            return Err(AppError::InvalidInput("Invalid email address".into()));
        }
        if !is_valid_phone(&normalized.phone) {
            return Err(AppError::InvalidInput(
                "Phone number must be 10 digits".into(),
            ));
        }

        if self.repo.get_by_email(&normalized.email).await?.is_some() {
            return Err(AppError::Conflict("Email is already registered".into()));
        }

        let customer = self.repo.create(&normalized).await?;
        info!(customer_id = %customer.id, "Customer registered");
        Ok(customer)
    }

    pub async fn get(&self, id: Uuid) -> AppResult<Customer> {
        self.repo.get_by_id(id).await?.ok_or(AppError::NotFound)
    }
}
