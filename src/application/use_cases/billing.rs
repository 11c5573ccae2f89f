use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDateTime;
use serde::Serialize;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::{
    app_error::{AppError, AppResult},
    application::ports::clock::Clock,
    domain::{
        calendar::{self, DateRange},
        entities::bill::{Bill, BillIncrement},
        proration::{self, BillingResult, SubscriptionTerms},
    },
    use_cases::{pause::PauseRepo, subscription::SubscriptionRepo},
};

#[derive(Debug, Clone, Copy)]
pub struct NewBill {
    pub customer_id: Uuid,
    pub month: i32,
    pub year: i32,
    pub increment: BillIncrement,
}

#[async_trait]
pub trait BillRepo: Send + Sync {
    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<Bill>>;
    async fn get_by_period(&self, customer_id: Uuid, month: i32, year: i32)
    -> AppResult<Option<Bill>>;
    /// Inserts an unpaid bill. Returns `None` if the period already has one.
    async fn insert_if_absent(&self, bill: &NewBill) -> AppResult<Option<Bill>>;
    /// Newest period first.
    async fn list_by_customer(&self, customer_id: Uuid) -> AppResult<Vec<Bill>>;
    async fn list_unpaid(&self, customer_id: Uuid) -> AppResult<Vec<Bill>>;
    /// Returns `None` when the bill is missing or already paid.
    async fn mark_paid(&self, id: Uuid, paid_at: NaiveDateTime) -> AppResult<Option<Bill>>;
    /// Single upsert: creates a paid bill or adds `increment` to the existing
    /// one and marks it paid.
    async fn merge_or_create(
        &self,
        customer_id: Uuid,
        month: i32,
        year: i32,
        increment: &BillIncrement,
        paid_at: NaiveDateTime,
    ) -> AppResult<Bill>;
}

#[derive(Debug, Clone)]
pub enum GenerateOutcome {
    Created(Bill),
    AlreadyExists(Bill),
    /// No billable subscription overlaps the month.
    NothingToBill,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationSummary {
    pub month: u32,
    pub year: i32,
    pub created: u32,
    pub skipped: u32,
    pub failed: u32,
}

#[derive(Clone)]
pub struct BillingUseCases {
    subscription_repo: Arc<dyn SubscriptionRepo>,
    pause_repo: Arc<dyn PauseRepo>,
    bill_repo: Arc<dyn BillRepo>,
    clock: Arc<dyn Clock>,
}

impl BillingUseCases {
    pub fn new(
        subscription_repo: Arc<dyn SubscriptionRepo>,
        pause_repo: Arc<dyn PauseRepo>,
        bill_repo: Arc<dyn BillRepo>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            subscription_repo,
            pause_repo,
            bill_repo,
            clock,
        }
    }

    /// Prorated charges for the customer over `window`.
    #[instrument(skip(self))]
    pub async fn compute_for_window(
        &self,
        customer_id: Uuid,
        window: DateRange,
    ) -> AppResult<BillingResult> {
        let subscriptions = self
            .subscription_repo
            .list_billable_in_range(customer_id, window)
            .await?;
        let terms = subscriptions
            .iter()
            .map(|s| s.terms())
            .collect::<Result<Vec<SubscriptionTerms>, _>>()?;

        let pauses: Vec<_> = self
            .pause_repo
            .list_in_range(customer_id, window)
            .await?
            .into_iter()
            .map(|p| p.pause_date)
            .collect();

        let result = proration::compute_billing(customer_id, window, &terms, &pauses);
        debug!(
            billable_days = result.billable_days,
            amount = result.amount,
            "Computed billing"
        );
        Ok(result)
    }

    /// Live estimate for the current local month.
    pub async fn estimate_current_month(&self, customer_id: Uuid) -> AppResult<BillingResult> {
        let window = DateRange::month_of(self.clock.today());
        self.compute_for_window(customer_id, window).await
    }

    /// Generates the customer's bill for the month. Running it again for the
    /// same period leaves the existing bill untouched.
    #[instrument(skip(self))]
    pub async fn generate(
        &self,
        customer_id: Uuid,
        month: u32,
        year: i32,
    ) -> AppResult<GenerateOutcome> {
        let window = calendar::month_bounds(year, month)?;
        let month = month as i32;

        if let Some(existing) = self
            .bill_repo
            .get_by_period(customer_id, month, year)
            .await?
        {
            return Ok(GenerateOutcome::AlreadyExists(existing));
        }

        let result = self.compute_for_window(customer_id, window).await?;
        let increment = BillIncrement::from(&result);
        if increment.is_empty() {
            return Ok(GenerateOutcome::NothingToBill);
        }

        let new_bill = NewBill {
            customer_id,
            month,
            year,
            increment,
        };
        match self.bill_repo.insert_if_absent(&new_bill).await? {
            Some(bill) => {
                info!(bill_id = %bill.id, amount = bill.amount, "Bill generated");
                Ok(GenerateOutcome::Created(bill))
            }
            None => {
                // Lost a race with a concurrent generation for the same period.
                let existing = self
                    .bill_repo
                    .get_by_period(customer_id, month, year)
                    .await?
                    .ok_or_else(|| {
                        AppError::Internal("Bill vanished after insert conflict".into())
                    })?;
                Ok(GenerateOutcome::AlreadyExists(existing))
            }
        }
    }

    /// Generates bills for every customer with a billable subscription in the
    /// month. One customer failing does not stop the batch.
    #[instrument(skip(self))]
    pub async fn generate_for_period(&self, month: u32, year: i32) -> AppResult<GenerationSummary> {
        let window = calendar::month_bounds(year, month)?;
        let customers = self
            .subscription_repo
            .list_customers_billable_in_range(window)
            .await?;

        let mut summary = GenerationSummary {
            month,
            year,
            ..Default::default()
        };
        for customer_id in customers {
            match self.generate(customer_id, month, year).await {
                Ok(GenerateOutcome::Created(_)) => summary.created += 1,
                Ok(GenerateOutcome::AlreadyExists(_) | GenerateOutcome::NothingToBill) => {
                    summary.skipped += 1
                }
                Err(e) => {
                    warn!(%customer_id, error = %e, "Bill generation failed");
                    summary.failed += 1;
                }
            }
        }

        info!(
            created = summary.created,
            skipped = summary.skipped,
            failed = summary.failed,
            "Bill generation finished"
        );
        Ok(summary)
    }

    pub async fn get_unpaid(&self, customer_id: Uuid) -> AppResult<Vec<Bill>> {
        self.bill_repo.list_unpaid(customer_id).await
    }

    pub async fn list_bills(&self, customer_id: Uuid) -> AppResult<Vec<Bill>> {
        self.bill_repo.list_by_customer(customer_id).await
    }

    pub async fn get_bill(&self, bill_id: Uuid) -> AppResult<Bill> {
        self.bill_repo
            .get_by_id(bill_id)
            .await?
            .ok_or(AppError::NotFound)
    }

    /// Paying is irreversible. Paying a paid bill returns it unchanged.
    #[instrument(skip(self))]
    pub async fn mark_paid(&self, bill_id: Uuid) -> AppResult<Bill> {
        let bill = self.get_bill(bill_id).await?;
        if bill.is_paid {
            return Ok(bill);
        }

        match self.bill_repo.mark_paid(bill_id, self.clock.now()).await? {
            Some(paid) => {
                info!(%bill_id, amount = paid.amount, "Bill marked paid");
                Ok(paid)
            }
            None => self.get_bill(bill_id).await,
        }
    }

    #[instrument(skip(self))]
    pub async fn merge_or_create(
        &self,
        customer_id: Uuid,
        month: u32,
        year: i32,
        increment: &BillIncrement,
    ) -> AppResult<Bill> {
        calendar::month_bounds(year, month)?;
        let bill = self
            .bill_repo
            .merge_or_create(customer_id, month as i32, year, increment, self.clock.now())
            .await?;
        info!(bill_id = %bill.id, amount = bill.amount, "Bill merged");
        Ok(bill)
    }
}
