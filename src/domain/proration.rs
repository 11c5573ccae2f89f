//! Proration engine.
//!
//! Turns subscription date ranges, daily rates and pause dates into billable
//! day counts and amounts over a window. The same function serves the live
//! dashboard estimate, monthly bill generation and the subscription purchase
//! path, so all three always agree.
//!
//! Pauses are counted per subscription. A day paused while two subscriptions
//! are active is subtracted from both.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::Serialize;
use uuid::Uuid;

use crate::domain::calendar::{self, DateRange, InvalidRange};

/// The billing-relevant part of a subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubscriptionTerms {
    pub subscription_id: Uuid,
    pub range: DateRange,
    pub daily_rate: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionCharge {
    pub subscription_id: Uuid,
    pub effective_range: DateRange,
    pub days_in_window: i64,
    pub paused_days: i64,
    pub billable_days: i64,
    pub daily_rate: i64,
    pub amount: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BillingResult {
    pub customer_id: Uuid,
    pub window: DateRange,
    pub total_days: i64,
    pub paused_days: i64,
    pub billable_days: i64,
    pub amount: i64,
    pub breakdown: Vec<SubscriptionCharge>,
}

impl BillingResult {
    pub fn empty(customer_id: Uuid, window: DateRange) -> Self {
        Self {
            customer_id,
            window,
            total_days: 0,
            paused_days: 0,
            billable_days: 0,
            amount: 0,
            breakdown: Vec::new(),
        }
    }
}

/// Billing for one calendar month of a longer span.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyBilling {
    pub year: i32,
    pub month: u32,
    pub result: BillingResult,
}

/// Computes the customer's billing over `window`.
///
/// Subscriptions that do not overlap the window contribute nothing and are
/// left out of the breakdown. The breakdown is ordered by effective start,
/// then subscription id, so the output does not depend on input order.
pub fn compute_billing(
    customer_id: Uuid,
    window: DateRange,
    subscriptions: &[SubscriptionTerms],
    pauses: &[NaiveDate],
) -> BillingResult {
    let pauses: BTreeSet<NaiveDate> = pauses.iter().copied().collect();

    let mut breakdown: Vec<SubscriptionCharge> = subscriptions
        .iter()
        .filter_map(|sub| charge_for(sub, &window, &pauses))
        .collect();
    breakdown.sort_by_key(|c| (c.effective_range.start(), c.subscription_id));

    let mut result = BillingResult::empty(customer_id, window);
    for charge in &breakdown {
        result.total_days += charge.days_in_window;
        result.paused_days += charge.paused_days;
        result.billable_days += charge.billable_days;
        result.amount += charge.amount;
    }
    result.breakdown = breakdown;
    result
}

/// Computes billing over `span` split into calendar months. Each month's
/// window is the part of `span` inside that month.
pub fn compute_billing_by_month(
    customer_id: Uuid,
    span: DateRange,
    subscriptions: &[SubscriptionTerms],
    pauses: &[NaiveDate],
) -> Result<Vec<MonthlyBilling>, InvalidRange> {
    let mut out = Vec::new();
    for (year, month) in span.months() {
        let bounds = calendar::month_bounds(year, month)?;
        let Some(window) = calendar::overlap(&span, &bounds) else {
            continue;
        };
        out.push(MonthlyBilling {
            year,
            month,
            result: compute_billing(customer_id, window, subscriptions, pauses),
        });
    }
    Ok(out)
}

fn charge_for(
    sub: &SubscriptionTerms,
    window: &DateRange,
    pauses: &BTreeSet<NaiveDate>,
) -> Option<SubscriptionCharge> {
    let effective = calendar::overlap(&sub.range, window)?;
    let days_in_window = calendar::inclusive_day_count(&effective);
    let paused_days = pauses.range(effective.start()..=effective.end()).count() as i64;
    let billable_days = (days_in_window - paused_days).max(0);

    Some(SubscriptionCharge {
        subscription_id: sub.subscription_id,
        effective_range: effective,
        days_in_window,
        paused_days,
        billable_days,
        daily_rate: sub.daily_rate,
        amount: billable_days * sub.daily_rate,
    })
}
