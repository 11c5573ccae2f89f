use async_trait::async_trait;
use chrono::NaiveDateTime;
use sqlx::{Postgres, Transaction};
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    adapters::persistence::{
        PostgresPersistence,
        bill::{credit_bill, get_bill, mark_bill_paid, merge_bill},
    },
    app_error::{AppError, AppResult},
    domain::entities::{bill::Bill, subscription::SubscriptionStatus},
    use_cases::payment::{
        Activated, NewPayment, PaymentRepo, ReplacedSubscription, Settled, SubscriptionActivation,
    },
};

/// Inserts the payment row. Returns false if the reference is already known,
/// in which case the caller must not apply anything.
async fn record_payment(tx: &mut Transaction<'_, Postgres>, payment: &NewPayment) -> AppResult<bool> {
    let inserted: Option<Uuid> = sqlx::query_scalar(
        r#"
        INSERT INTO payments (
            id, external_reference, customer_id, amount, purpose,
            bill_id, subscription_id, received_at
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        ON CONFLICT (external_reference) DO NOTHING
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(&payment.external_reference)
    .bind(payment.customer_id)
    .bind(payment.amount)
    .bind(payment.purpose)
    .bind(payment.bill_id)
    .bind(payment.subscription_id)
    .bind(payment.received_at)
    .fetch_optional(&mut **tx)
    .await
    .map_err(AppError::from)?;
    Ok(inserted.is_some())
}

/// Truncates or cancels a replaced subscription and takes the days it loses
/// back out of its bills. Returns false if the subscription is no longer the
/// active one the plan was built from.
async fn apply_replacement(
    tx: &mut Transaction<'_, Postgres>,
    customer_id: Uuid,
    replaced: &ReplacedSubscription,
    at: NaiveDateTime,
) -> AppResult<bool> {
    let updated = match replaced.new_end {
        Some(new_end) => sqlx::query(
            r#"
            UPDATE subscriptions SET end_date = $1
            WHERE id = $2 AND customer_id = $3 AND status = $4 AND end_date = $5
            "#,
        )
        .bind(new_end),
        None => sqlx::query(
            r#"
            UPDATE subscriptions SET status = $1
            WHERE id = $2 AND customer_id = $3 AND status = $4 AND end_date = $5
            "#,
        )
        .bind(SubscriptionStatus::Canceled),
    }
    .bind(replaced.subscription_id)
    .bind(customer_id)
    .bind(SubscriptionStatus::Active)
    .bind(replaced.previous_end)
    .execute(&mut **tx)
    .await
    .map_err(AppError::from)?;
    if updated.rows_affected() == 0 {
        return Ok(false);
    }

    for credit in &replaced.credits {
        let credited = credit_bill(
            &mut **tx,
            customer_id,
            credit.month,
            credit.year,
            &credit.increment,
            at,
        )
        .await?;
        if credited.is_none() {
            warn!(
                %customer_id,
                subscription_id = %replaced.subscription_id,
                month = credit.month,
                year = credit.year,
                "No bill to credit for replaced subscription"
            );
        }
    }
    Ok(true)
}

#[async_trait]
impl PaymentRepo for PostgresPersistence {
    async fn exists_by_reference(&self, external_reference: &str) -> AppResult<bool> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM payments WHERE external_reference = $1)",
        )
        .bind(external_reference)
        .fetch_one(self.pool())
        .await
        .map_err(AppError::from)
    }

    async fn settle_bill(&self, payment: &NewPayment, bill_id: Uuid) -> AppResult<Settled<Bill>> {
        let mut tx = self.pool().begin().await.map_err(AppError::from)?;

        if !record_payment(&mut tx, payment).await? {
            return Ok(Settled::Duplicate);
        }

        let bill = match mark_bill_paid(&mut *tx, bill_id, payment.received_at).await? {
            Some(bill) => bill,
            // Already paid earlier. Keep the original paid_at.
            None => get_bill(&mut *tx, bill_id).await?.ok_or(AppError::NotFound)?,
        };

        tx.commit().await.map_err(AppError::from)?;
        Ok(Settled::Applied(bill))
    }

    async fn settle_subscription(
        &self,
        payment: &NewPayment,
        activation: &SubscriptionActivation,
    ) -> AppResult<Activated> {
        let mut tx = self.pool().begin().await.map_err(AppError::from)?;

        if !record_payment(&mut tx, payment).await? {
            return Ok(Activated::Duplicate);
        }

        let activated = sqlx::query(
            "UPDATE subscriptions SET status = $1 WHERE id = $2 AND status = $3",
        )
        .bind(SubscriptionStatus::Active)
        .bind(activation.subscription_id)
        .bind(SubscriptionStatus::PendingPayment)
        .execute(&mut *tx)
        .await
        .map_err(AppError::from)?;
        if activated.rows_affected() == 0 {
            return Err(AppError::Conflict(
                "Subscription is not awaiting payment".into(),
            ));
        }

        for replaced in &activation.replaced {
            if !apply_replacement(&mut tx, activation.customer_id, replaced, payment.received_at)
                .await?
            {
                return Ok(Activated::Stale);
            }
        }
        if !activation.replaced.is_empty() {
            info!(
                customer_id = %activation.customer_id,
                replaced = activation.replaced.len(),
                "Replaced overlapping subscriptions"
            );
        }

        let mut bills = Vec::with_capacity(activation.charges.len());
        for charge in &activation.charges {
            let bill = merge_bill(
                &mut *tx,
                activation.customer_id,
                charge.month,
                charge.year,
                &charge.increment,
                payment.received_at,
            )
            .await?;
            bills.push(bill);
        }

        tx.commit().await.map_err(AppError::from)?;
        Ok(Activated::Applied(bills))
    }
}
