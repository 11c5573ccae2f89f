use std::sync::Arc;

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use serde::Deserialize;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    app_error::{AppError, AppResult},
    application::ports::clock::Clock,
    domain::{
        entities::{
            bill::{Bill, BillIncrement},
            payment::PaymentPurpose,
            subscription::{Subscription, SubscriptionStatus},
        },
        calendar::{self, DateRange},
        proration::{self, SubscriptionTerms},
    },
    use_cases::{billing::BillRepo, pause::PauseRepo, subscription::SubscriptionRepo},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum PaymentTarget {
    Bill { bill_id: Uuid },
    Subscription { subscription_id: Uuid },
}

/// Payment confirmation as delivered by the gateway webhook.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentConfirmation {
    pub external_reference: String,
    pub customer_id: Uuid,
    pub amount: i64,
    pub target: PaymentTarget,
}

#[derive(Debug, Clone)]
pub struct NewPayment {
    pub external_reference: String,
    pub customer_id: Uuid,
    pub amount: i64,
    pub purpose: PaymentPurpose,
    pub bill_id: Option<Uuid>,
    pub subscription_id: Option<Uuid>,
    pub received_at: NaiveDateTime,
}

/// One calendar month's share of a purchased subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthlyCharge {
    pub year: i32,
    pub month: i32,
    pub increment: BillIncrement,
}

/// An active subscription cut back by a replacing purchase, with the
/// prepaid days it no longer serves.
#[derive(Debug, Clone)]
pub struct ReplacedSubscription {
    pub subscription_id: Uuid,
    /// End date the subscription had when the activation was planned.
    pub previous_end: NaiveDate,
    /// `None` cancels the subscription instead of truncating it.
    pub new_end: Option<NaiveDate>,
    /// Per-month amounts to take back out of the already paid bills.
    pub credits: Vec<MonthlyCharge>,
}

/// Everything needed to activate a paid subscription in one transaction.
#[derive(Debug, Clone)]
pub struct SubscriptionActivation {
    pub subscription_id: Uuid,
    pub customer_id: Uuid,
    pub replaced: Vec<ReplacedSubscription>,
    pub charges: Vec<MonthlyCharge>,
}

#[derive(Debug, Clone)]
pub enum Settled<T> {
    Applied(T),
    /// The external reference was already recorded. Nothing changed.
    Duplicate,
}

#[derive(Debug, Clone)]
pub enum Activated {
    Applied(Vec<Bill>),
    /// The external reference was already recorded. Nothing changed.
    Duplicate,
    /// A replaced subscription changed after the activation was planned.
    /// Nothing changed.
    Stale,
}

const MAX_ACTIVATION_ATTEMPTS: u32 = 3;

#[async_trait]
pub trait PaymentRepo: Send + Sync {
    async fn exists_by_reference(&self, external_reference: &str) -> AppResult<bool>;
    /// Records the payment and marks the bill paid atomically.
    async fn settle_bill(&self, payment: &NewPayment, bill_id: Uuid) -> AppResult<Settled<Bill>>;
    /// Records the payment, activates the subscription, truncates or cancels
    /// the replaced subscriptions, credits their bills and merges the monthly
    /// charges, atomically. Order of checks: duplicate reference, then
    /// pending status, then staleness of `activation.replaced`.
    async fn settle_subscription(
        &self,
        payment: &NewPayment,
        activation: &SubscriptionActivation,
    ) -> AppResult<Activated>;
}

#[derive(Debug, Clone)]
pub enum PaymentOutcome {
    Duplicate,
    BillPaid(Bill),
    SubscriptionActivated { subscription_id: Uuid, bills: Vec<Bill> },
}

#[derive(Clone)]
pub struct PaymentUseCases {
    payment_repo: Arc<dyn PaymentRepo>,
    bill_repo: Arc<dyn BillRepo>,
    subscription_repo: Arc<dyn SubscriptionRepo>,
    pause_repo: Arc<dyn PauseRepo>,
    clock: Arc<dyn Clock>,
}

impl PaymentUseCases {
    pub fn new(
        payment_repo: Arc<dyn PaymentRepo>,
        bill_repo: Arc<dyn BillRepo>,
        subscription_repo: Arc<dyn SubscriptionRepo>,
        pause_repo: Arc<dyn PauseRepo>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            payment_repo,
            bill_repo,
            subscription_repo,
            pause_repo,
            clock,
        }
    }

    #[instrument(skip(self, event), fields(reference = %event.external_reference, customer_id = %event.customer_id))]
    pub async fn confirm(&self, event: &PaymentConfirmation) -> AppResult<PaymentOutcome> {
        if event.external_reference.trim().is_empty() {
            return Err(AppError::InvalidInput("Payment reference is required".into()));
        }
        if self
            .payment_repo
            .exists_by_reference(&event.external_reference)
            .await?
        {
            info!("Duplicate payment confirmation ignored");
            return Ok(PaymentOutcome::Duplicate);
        }

        match event.target {
            PaymentTarget::Bill { bill_id } => self.settle_bill(event, bill_id).await,
            PaymentTarget::Subscription { subscription_id } => {
                self.activate_subscription(event, subscription_id).await
            }
        }
    }

    async fn settle_bill(
        &self,
        event: &PaymentConfirmation,
        bill_id: Uuid,
    ) -> AppResult<PaymentOutcome> {
        let bill = self
            .bill_repo
            .get_by_id(bill_id)
            .await?
            .filter(|b| b.customer_id == event.customer_id)
            .ok_or(AppError::NotFound)?;
        if bill.amount != event.amount {
            warn!(
                %bill_id,
                bill_amount = bill.amount,
                paid_amount = event.amount,
                "Payment amount differs from bill amount"
            );
        }

        let payment = self.new_payment(event, PaymentPurpose::Bill, Some(bill_id), None);
        match self.payment_repo.settle_bill(&payment, bill_id).await? {
            Settled::Applied(bill) => {
                info!(%bill_id, "Bill paid");
                Ok(PaymentOutcome::BillPaid(bill))
            }
            Settled::Duplicate => Ok(PaymentOutcome::Duplicate),
        }
    }

    async fn activate_subscription(
        &self,
        event: &PaymentConfirmation,
        subscription_id: Uuid,
    ) -> AppResult<PaymentOutcome> {
        let subscription = self
            .subscription_repo
            .get_by_id(subscription_id)
            .await?
            .filter(|s| s.customer_id == event.customer_id)
            .ok_or(AppError::NotFound)?;
        if subscription.status != SubscriptionStatus::PendingPayment {
            return Err(AppError::Conflict(format!(
                "Subscription is {}, not awaiting payment",
                subscription.status
            )));
        }

        let payment = self.new_payment(
            event,
            PaymentPurpose::Subscription,
            None,
            Some(subscription_id),
        );
        for attempt in 1..=MAX_ACTIVATION_ATTEMPTS {
            let activation = self.plan_activation(&subscription).await?;
            if attempt == 1 {
                let expected: i64 = activation.charges.iter().map(|c| c.increment.amount).sum();
                if expected != event.amount {
                    warn!(
                        %subscription_id,
                        expected,
                        paid_amount = event.amount,
                        "Payment amount differs from prorated subscription amount"
                    );
                }
            }

            match self
                .payment_repo
                .settle_subscription(&payment, &activation)
                .await?
            {
                Activated::Applied(bills) => {
                    info!(
                        %subscription_id,
                        months = bills.len(),
                        replaced = activation.replaced.len(),
                        "Subscription activated"
                    );
                    return Ok(PaymentOutcome::SubscriptionActivated {
                        subscription_id,
                        bills,
                    });
                }
                Activated::Duplicate => return Ok(PaymentOutcome::Duplicate),
                Activated::Stale => {
                    warn!(%subscription_id, attempt, "Replaced subscriptions changed, replanning");
                }
            }
        }
        Err(AppError::Internal(
            "Subscription activation kept conflicting with concurrent changes".into(),
        ))
    }

    /// Prorates the subscription over its own span, split by calendar month,
    /// and works out which active subscriptions it replaces.
    async fn plan_activation(&self, subscription: &Subscription) -> AppResult<SubscriptionActivation> {
        let terms = subscription.terms()?;
        let charges = self
            .monthly_charges(subscription.customer_id, terms.range, terms)
            .await?;
        let replaced = if subscription.replaces_existing {
            self.plan_replacements(subscription, terms.range).await?
        } else {
            Vec::new()
        };

        Ok(SubscriptionActivation {
            subscription_id: subscription.id,
            customer_id: subscription.customer_id,
            replaced,
            charges,
        })
    }

    /// Active subscriptions overlapping `range` end the day before it starts,
    /// or are canceled when they start inside it. The days they lose were
    /// paid at their own activation and are credited back.
    async fn plan_replacements(
        &self,
        subscription: &Subscription,
        range: DateRange,
    ) -> AppResult<Vec<ReplacedSubscription>> {
        let others = self
            .subscription_repo
            .list_by_customer(subscription.customer_id)
            .await?;

        let mut replaced = Vec::new();
        for other in others
            .iter()
            .filter(|s| s.id != subscription.id && s.status == SubscriptionStatus::Active)
        {
            let other_terms = other.terms()?;
            if calendar::overlap(&other_terms.range, &range).is_none() {
                continue;
            }
            let (new_end, removed) = if other.start_date >= range.start() {
                (None, other_terms.range)
            } else {
                let day_before = range.start().pred_opt().ok_or_else(|| {
                    AppError::Internal("Subscription starts at the minimum date".into())
                })?;
                (Some(day_before), DateRange::new(range.start(), other.end_date)?)
            };

            replaced.push(ReplacedSubscription {
                subscription_id: other.id,
                previous_end: other.end_date,
                new_end,
                credits: self
                    .monthly_charges(subscription.customer_id, removed, other_terms)
                    .await?,
            });
        }
        Ok(replaced)
    }

    async fn monthly_charges(
        &self,
        customer_id: Uuid,
        span: DateRange,
        terms: SubscriptionTerms,
    ) -> AppResult<Vec<MonthlyCharge>> {
        let pauses: Vec<_> = self
            .pause_repo
            .list_in_range(customer_id, span)
            .await?
            .into_iter()
            .map(|p| p.pause_date)
            .collect();

        Ok(
            proration::compute_billing_by_month(customer_id, span, &[terms], &pauses)?
                .iter()
                .map(|m| MonthlyCharge {
                    year: m.year,
                    month: m.month as i32,
                    increment: BillIncrement::from(&m.result),
                })
                .filter(|c| !c.increment.is_empty())
                .collect(),
        )
    }

    fn new_payment(
        &self,
        event: &PaymentConfirmation,
        purpose: PaymentPurpose,
        bill_id: Option<Uuid>,
        subscription_id: Option<Uuid>,
    ) -> NewPayment {
        NewPayment {
            external_reference: event.external_reference.trim().to_string(),
            customer_id: event.customer_id,
            amount: event.amount,
            purpose,
            bill_id,
            subscription_id,
            received_at: self.clock.now(),
        }
    }
}
