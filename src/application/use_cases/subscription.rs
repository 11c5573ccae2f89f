use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Deserialize;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    app_error::{AppError, AppResult},
    application::ports::clock::Clock,
    domain::{
        calendar::DateRange,
        entities::subscription::{Subscription, SubscriptionStatus},
    },
    use_cases::{customer::CustomerRepo, plan::PlanRepo},
};

#[derive(Debug, Clone)]
pub struct CreateSubscriptionInput {
    pub customer_id: Uuid,
    pub plan_id: Uuid,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub daily_rate: i64,
    pub replaces_existing: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscribeInput {
    pub plan_id: Uuid,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default = "default_replace_existing")]
    pub replace_existing: bool,
}

fn default_replace_existing() -> bool {
    true
}

#[async_trait]
pub trait SubscriptionRepo: Send + Sync {
    async fn create(&self, input: &CreateSubscriptionInput) -> AppResult<Subscription>;
    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<Subscription>>;
    async fn list_by_customer(&self, customer_id: Uuid) -> AppResult<Vec<Subscription>>;
    /// Active or expired subscriptions of the customer overlapping `range`.
    async fn list_billable_in_range(
        &self,
        customer_id: Uuid,
        range: DateRange,
    ) -> AppResult<Vec<Subscription>>;
    /// Customers with at least one billable subscription overlapping `range`.
    async fn list_customers_billable_in_range(&self, range: DateRange) -> AppResult<Vec<Uuid>>;
    async fn delete(&self, id: Uuid) -> AppResult<()>;
    /// Marks active subscriptions ending before `date` as expired.
    async fn expire_ended_before(&self, date: NaiveDate) -> AppResult<u64>;
}

#[derive(Clone)]
pub struct SubscriptionUseCases {
    repo: Arc<dyn SubscriptionRepo>,
    plan_repo: Arc<dyn PlanRepo>,
    customer_repo: Arc<dyn CustomerRepo>,
    clock: Arc<dyn Clock>,
}

impl SubscriptionUseCases {
    pub fn new(
        repo: Arc<dyn SubscriptionRepo>,
        plan_repo: Arc<dyn PlanRepo>,
        customer_repo: Arc<dyn CustomerRepo>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            repo,
            plan_repo,
            customer_repo,
            clock,
        }
    }

    /// Creates a subscription awaiting payment. It becomes active when the
    /// payment confirmation arrives.
    #[instrument(skip(self, input), fields(plan_id = %input.plan_id))]
    pub async fn subscribe(
        &self,
        customer_id: Uuid,
        input: &SubscribeInput,
    ) -> AppResult<Subscription> {
        DateRange::new(input.start_date, input.end_date)?;
        if input.start_date < self.clock.today() {
            return Err(AppError::PastDate);
        }

        self.customer_repo
            .get_by_id(customer_id)
            .await?
            .ok_or(AppError::NotFound)?;

        let plan = self
            .plan_repo
            .get_by_id(input.plan_id)
            .await?
            .ok_or(AppError::NotFound)?;
        if !plan.is_active {
            return Err(AppError::InvalidInput(
                "This plan is no longer available".into(),
            ));
        }

        let subscription = self
            .repo
            .create(&CreateSubscriptionInput {
                customer_id,
                plan_id: plan.id,
                start_date: input.start_date,
                end_date: input.end_date,
                daily_rate: plan.daily_rate,
                replaces_existing: input.replace_existing,
            })
            .await?;

        info!(
            subscription_id = %subscription.id,
            %customer_id,
            daily_rate = subscription.daily_rate,
            "Subscription created, awaiting payment"
        );
        Ok(subscription)
    }

    /// Cancellation is only possible before the subscription starts.
    #[instrument(skip(self))]
    pub async fn cancel(&self, customer_id: Uuid, subscription_id: Uuid) -> AppResult<()> {
        let subscription = self
            .repo
            .get_by_id(subscription_id)
            .await?
            .filter(|s| s.customer_id == customer_id)
            .ok_or(AppError::NotFound)?;

        if subscription.start_date <= self.clock.today() {
            return Err(AppError::InvalidInput(
                "Subscription has already started and can no longer be canceled".into(),
            ));
        }
        if subscription.status == SubscriptionStatus::Canceled {
            return Err(AppError::NotFound);
        }

        self.repo.delete(subscription.id).await?;
        info!(%subscription_id, %customer_id, "Subscription canceled before start");
        Ok(())
    }

    pub async fn list(&self, customer_id: Uuid) -> AppResult<Vec<Subscription>> {
        self.repo.list_by_customer(customer_id).await
    }

    /// Moves lapsed active subscriptions to expired.
    #[instrument(skip(self))]
    pub async fn sweep_expired(&self) -> AppResult<u64> {
        let today = self.clock.today();
        let expired = self.repo.expire_ended_before(today).await?;
        if expired > 0 {
            info!(expired, %today, "Expired lapsed subscriptions");
        }
        Ok(expired)
    }
}
