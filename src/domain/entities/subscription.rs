use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::calendar::{DateRange, InvalidRange};
use crate::domain::proration::SubscriptionTerms;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "subscription_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    PendingPayment,
    Active,
    Expired,
    Canceled,
}

impl SubscriptionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionStatus::PendingPayment => "pending_payment",
            SubscriptionStatus::Active => "active",
            SubscriptionStatus::Expired => "expired",
            SubscriptionStatus::Canceled => "canceled",
        }
    }

    /// Days covered by the subscription are charged for.
    ///
    /// Expired subscriptions stay billable so that a month closed after the
    /// sweeper ran still sees them.
    pub fn is_billable(&self) -> bool {
        matches!(self, SubscriptionStatus::Active | SubscriptionStatus::Expired)
    }
}

impl std::fmt::Display for SubscriptionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for SubscriptionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending_payment" => Ok(SubscriptionStatus::PendingPayment),
            "active" => Ok(SubscriptionStatus::Active),
            "expired" => Ok(SubscriptionStatus::Expired),
            "canceled" | "cancelled" => Ok(SubscriptionStatus::Canceled),
            _ => Err(format!("Invalid subscription status: {}", s)),
        }
    }
}

/// A customer's enrollment in a plan. The daily rate is copied from the plan
/// when the subscription is created and never follows later plan edits.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Subscription {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub plan_id: Uuid,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub daily_rate: i64,
    pub status: SubscriptionStatus,
    pub replaces_existing: bool,
    pub created_at: NaiveDateTime,
}

impl Subscription {
    pub fn range(&self) -> Result<DateRange, InvalidRange> {
        DateRange::new(self.start_date, self.end_date)
    }

    pub fn terms(&self) -> Result<SubscriptionTerms, InvalidRange> {
        Ok(SubscriptionTerms {
            subscription_id: self.id,
            range: self.range()?,
            daily_rate: self.daily_rate,
        })
    }
}
