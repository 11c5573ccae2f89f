//! Test data factories.
//!
//! Each factory returns a complete, valid object. Use the closure parameter to
//! override specific fields.

use chrono::{NaiveDate, NaiveDateTime};
use uuid::Uuid;

use crate::domain::entities::{
    bill::Bill,
    customer::Customer,
    plan::Plan,
    subscription::{Subscription, SubscriptionStatus},
};

pub fn create_test_customer(overrides: impl FnOnce(&mut Customer)) -> Customer {
    let id = Uuid::new_v4();
    let mut customer = Customer {
        id,
        full_name: "Priya Nair".to_string(),
        email: format!("customer-{}@example.com", id.simple()),
        phone: "9876543210".to_string(),
        created_at: test_datetime(),
    };
    overrides(&mut customer);
    customer
}

pub fn create_test_plan(overrides: impl FnOnce(&mut Plan)) -> Plan {
    let mut plan = Plan {
        id: Uuid::new_v4(),
        name: "Veg Lunch".to_string(),
        description: Some("Two rotis, dal, sabzi and rice".to_string()),
        daily_rate: 100,
        is_active: true,
        created_at: test_datetime(),
    };
    overrides(&mut plan);
    plan
}

pub fn create_test_subscription(
    customer_id: Uuid,
    overrides: impl FnOnce(&mut Subscription),
) -> Subscription {
    let mut subscription = Subscription {
        id: Uuid::new_v4(),
        customer_id,
        plan_id: Uuid::new_v4(),
        start_date: test_date(2024, 1, 1),
        end_date: test_date(2024, 1, 31),
        daily_rate: 100,
        status: SubscriptionStatus::Active,
        replaces_existing: true,
        created_at: test_datetime(),
    };
    overrides(&mut subscription);
    subscription
}

pub fn create_test_bill(customer_id: Uuid, overrides: impl FnOnce(&mut Bill)) -> Bill {
    let mut bill = Bill {
        id: Uuid::new_v4(),
        customer_id,
        month: 1,
        year: 2024,
        total_days: 0,
        paused_days: 0,
        billable_days: 0,
        amount: 0,
        is_paid: false,
        paid_at: None,
        created_at: test_datetime(),
        updated_at: test_datetime(),
    };
    overrides(&mut bill);
    bill
}

pub fn test_date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid test date")
}

/// Fixed timestamp so fixtures are reproducible.
pub fn test_datetime() -> NaiveDateTime {
    test_date(2024, 1, 1)
        .and_hms_opt(9, 0, 0)
        .expect("valid test time")
}
