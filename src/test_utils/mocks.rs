//! In-memory implementations of the repository traits.
//!
//! One `InMemoryPersistence` backs every repository so that payment
//! settlement can touch bills, subscriptions and payments under a single
//! lock, the way the Postgres adapter does inside one transaction.

use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use uuid::Uuid;

use crate::{
    app_error::{AppError, AppResult},
    application::ports::{clock::Clock, storage::StorageHealth},
    domain::{
        calendar::DateRange,
        entities::{
            bill::{Bill, BillIncrement},
            customer::Customer,
            pause::Pause,
            payment::Payment,
            plan::Plan,
            subscription::{Subscription, SubscriptionStatus},
        },
    },
    test_utils::{create_test_bill, create_test_subscription, test_datetime},
    use_cases::{
        billing::{BillRepo, NewBill},
        customer::{CustomerRepo, RegisterCustomerInput},
        pause::PauseRepo,
        payment::{
            Activated, NewPayment, PaymentRepo, ReplacedSubscription, Settled,
            SubscriptionActivation,
        },
        plan::{CreatePlanInput, PlanRepo},
        subscription::{CreateSubscriptionInput, SubscriptionRepo},
    },
};

// ============================================================================
// FixedClock
// ============================================================================

pub struct FixedClock {
    now: Mutex<NaiveDateTime>,
}

impl FixedClock {
    pub fn new(now: NaiveDateTime) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    pub fn set(&self, now: NaiveDateTime) {
        *self.now.lock().unwrap() = now;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        *self.now.lock().unwrap()
    }
}

// ============================================================================
// InMemoryPersistence
// ============================================================================

#[derive(Default)]
struct State {
    customers: HashMap<Uuid, Customer>,
    plans: HashMap<Uuid, Plan>,
    subscriptions: HashMap<Uuid, Subscription>,
    pauses: BTreeMap<(Uuid, NaiveDate), Pause>,
    bills: HashMap<Uuid, Bill>,
    payments: HashMap<String, Payment>,
}

impl State {
    fn bill_for_period(&self, customer_id: Uuid, month: i32, year: i32) -> Option<&Bill> {
        self.bills
            .values()
            .find(|b| b.customer_id == customer_id && b.month == month && b.year == year)
    }

    fn merge_bill(
        &mut self,
        customer_id: Uuid,
        month: i32,
        year: i32,
        increment: &BillIncrement,
        paid_at: NaiveDateTime,
    ) -> Bill {
        let bill = match self.bill_for_period(customer_id, month, year) {
            Some(existing) => Bill {
                is_paid: true,
                paid_at: existing.paid_at.or(Some(paid_at)),
                updated_at: paid_at,
                ..existing.merged(increment)
            },
            None => create_test_bill(customer_id, |b| {
                b.month = month;
                b.year = year;
                b.total_days = increment.total_days;
                b.paused_days = increment.paused_days;
                b.billable_days = increment.billable_days;
                b.amount = increment.amount;
                b.is_paid = true;
                b.paid_at = Some(paid_at);
                b.created_at = paid_at;
                b.updated_at = paid_at;
            }),
        };
        self.bills.insert(bill.id, bill.clone());
        bill
    }

    /// Callers check the reference first, as the unique key does in Postgres.
    fn record_payment(&mut self, payment: &NewPayment) {
        self.payments.insert(
            payment.external_reference.clone(),
            Payment {
                id: Uuid::new_v4(),
                external_reference: payment.external_reference.clone(),
                customer_id: payment.customer_id,
                amount: payment.amount,
                purpose: payment.purpose,
                bill_id: payment.bill_id,
                subscription_id: payment.subscription_id,
                received_at: payment.received_at,
            },
        );
    }

    /// True while the subscription is still the active one the replacement
    /// was planned from.
    fn replacement_is_current(&self, customer_id: Uuid, replaced: &ReplacedSubscription) -> bool {
        self.subscriptions
            .get(&replaced.subscription_id)
            .is_some_and(|s| {
                s.customer_id == customer_id
                    && s.status == SubscriptionStatus::Active
                    && s.end_date == replaced.previous_end
            })
    }

    fn apply_replacement(&mut self, customer_id: Uuid, replaced: &ReplacedSubscription, at: NaiveDateTime) {
        if let Some(sub) = self.subscriptions.get_mut(&replaced.subscription_id) {
            match replaced.new_end {
                Some(new_end) => sub.end_date = new_end,
                None => sub.status = SubscriptionStatus::Canceled,
            }
        }
        for credit in &replaced.credits {
            let Some(bill) = self
                .bills
                .values_mut()
                .find(|b| b.customer_id == customer_id && b.month == credit.month && b.year == credit.year)
            else {
                continue;
            };
            bill.total_days -= credit.increment.total_days;
            bill.paused_days -= credit.increment.paused_days;
            bill.billable_days -= credit.increment.billable_days;
            bill.amount -= credit.increment.amount;
            bill.updated_at = at;
        }
    }
}

#[derive(Default)]
pub struct InMemoryPersistence {
    state: Mutex<State>,
    /// Another writer creates the period's bill just before the next insert.
    concurrent_bill_insert: AtomicBool,
}

impl InMemoryPersistence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed_customer(&self, customer: Customer) -> Customer {
        self.state
            .lock()
            .unwrap()
            .customers
            .insert(customer.id, customer.clone());
        customer
    }

    pub fn seed_plan(&self, plan: Plan) -> Plan {
        self.state
            .lock()
            .unwrap()
            .plans
            .insert(plan.id, plan.clone());
        plan
    }

    pub fn update_plan_rate(&self, plan_id: Uuid, daily_rate: i64) {
        if let Some(plan) = self.state.lock().unwrap().plans.get_mut(&plan_id) {
            plan.daily_rate = daily_rate;
        }
    }

    pub fn seed_subscription(
        &self,
        customer_id: Uuid,
        start_date: NaiveDate,
        end_date: NaiveDate,
        daily_rate: i64,
        status: SubscriptionStatus,
    ) -> Subscription {
        let subscription = create_test_subscription(customer_id, |s| {
            s.start_date = start_date;
            s.end_date = end_date;
            s.daily_rate = daily_rate;
            s.status = status;
        });
        self.state
            .lock()
            .unwrap()
            .subscriptions
            .insert(subscription.id, subscription.clone());
        subscription
    }

    pub fn set_replaces_existing(&self, subscription_id: Uuid, replaces_existing: bool) {
        if let Some(sub) = self
            .state
            .lock()
            .unwrap()
            .subscriptions
            .get_mut(&subscription_id)
        {
            sub.replaces_existing = replaces_existing;
        }
    }

    pub fn subscription(&self, id: Uuid) -> Option<Subscription> {
        self.state.lock().unwrap().subscriptions.get(&id).cloned()
    }

    pub fn seed_pause(&self, customer_id: Uuid, pause_date: NaiveDate) {
        self.state.lock().unwrap().pauses.insert(
            (customer_id, pause_date),
            Pause {
                customer_id,
                pause_date,
                created_at: test_datetime(),
            },
        );
    }

    pub fn seed_bill(&self, customer_id: Uuid, month: i32, year: i32, amount: i64) -> Bill {
        let bill = create_test_bill(customer_id, |b| {
            b.month = month;
            b.year = year;
            b.amount = amount;
        });
        self.state
            .lock()
            .unwrap()
            .bills
            .insert(bill.id, bill.clone());
        bill
    }

    /// Bills of the customer in period order.
    pub fn bills_for(&self, customer_id: Uuid) -> Vec<Bill> {
        let mut bills: Vec<Bill> = self
            .state
            .lock()
            .unwrap()
            .bills
            .values()
            .filter(|b| b.customer_id == customer_id)
            .cloned()
            .collect();
        bills.sort_by_key(|b| (b.year, b.month));
        bills
    }

    /// Makes the next `insert_if_absent` lose to a concurrent generation of
    /// the same bill.
    pub fn race_next_bill_insert(&self) {
        self.concurrent_bill_insert.store(true, Ordering::SeqCst);
    }

    pub fn payment_count(&self) -> usize {
        self.state.lock().unwrap().payments.len()
    }
}

#[async_trait]
impl CustomerRepo for InMemoryPersistence {
    async fn create(&self, input: &RegisterCustomerInput) -> AppResult<Customer> {
        let mut state = self.state.lock().unwrap();
        if state.customers.values().any(|c| c.email == input.email) {
            return Err(AppError::Conflict("Email is already registered".into()));
        }
        let customer = Customer {
            id: Uuid::new_v4(),
            full_name: input.full_name.clone(),
            email: input.email.clone(),
            phone: input.phone.clone(),
            created_at: test_datetime(),
        };
        state.customers.insert(customer.id, customer.clone());
        Ok(customer)
    }

    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<Customer>> {
        Ok(self.state.lock().unwrap().customers.get(&id).cloned())
    }

    async fn get_by_email(&self, email: &str) -> AppResult<Option<Customer>> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .customers
            .values()
            .find(|c| c.email == email)
            .cloned())
    }
}

#[async_trait]
impl PlanRepo for InMemoryPersistence {
    async fn create(&self, input: &CreatePlanInput) -> AppResult<Plan> {
        let plan = Plan {
            id: Uuid::new_v4(),
            name: input.name.clone(),
            description: input.description.clone(),
            daily_rate: input.daily_rate,
            is_active: true,
            created_at: test_datetime(),
        };
        Ok(self.seed_plan(plan))
    }

    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<Plan>> {
        Ok(self.state.lock().unwrap().plans.get(&id).cloned())
    }

    async fn list_active(&self) -> AppResult<Vec<Plan>> {
        let mut plans: Vec<Plan> = self
            .state
            .lock()
            .unwrap()
            .plans
            .values()
            .filter(|p| p.is_active)
            .cloned()
            .collect();
        plans.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(plans)
    }

    async fn set_active(&self, id: Uuid, is_active: bool) -> AppResult<Option<Plan>> {
        let mut state = self.state.lock().unwrap();
        Ok(state.plans.get_mut(&id).map(|plan| {
            plan.is_active = is_active;
            plan.clone()
        }))
    }
}

#[async_trait]
impl SubscriptionRepo for InMemoryPersistence {
    async fn create(&self, input: &CreateSubscriptionInput) -> AppResult<Subscription> {
        let subscription = Subscription {
            id: Uuid::new_v4(),
            customer_id: input.customer_id,
            plan_id: input.plan_id,
            start_date: input.start_date,
            end_date: input.end_date,
            daily_rate: input.daily_rate,
            status: SubscriptionStatus::PendingPayment,
            replaces_existing: input.replaces_existing,
            created_at: test_datetime(),
        };
        self.state
            .lock()
            .unwrap()
            .subscriptions
            .insert(subscription.id, subscription.clone());
        Ok(subscription)
    }

    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<Subscription>> {
        Ok(self.subscription(id))
    }

    async fn list_by_customer(&self, customer_id: Uuid) -> AppResult<Vec<Subscription>> {
        let mut subs: Vec<Subscription> = self
            .state
            .lock()
            .unwrap()
            .subscriptions
            .values()
            .filter(|s| s.customer_id == customer_id)
            .cloned()
            .collect();
        subs.sort_by_key(|s| (s.start_date, s.id));
        Ok(subs)
    }

    async fn list_billable_in_range(
        &self,
        customer_id: Uuid,
        range: DateRange,
    ) -> AppResult<Vec<Subscription>> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .subscriptions
            .values()
            .filter(|s| {
                s.customer_id == customer_id
                    && s.status.is_billable()
                    && s.start_date <= range.end()
                    && s.end_date >= range.start()
            })
            .cloned()
            .collect())
    }

    async fn list_customers_billable_in_range(&self, range: DateRange) -> AppResult<Vec<Uuid>> {
        let mut customers: Vec<Uuid> = self
            .state
            .lock()
            .unwrap()
            .subscriptions
            .values()
            .filter(|s| {
                s.status.is_billable() && s.start_date <= range.end() && s.end_date >= range.start()
            })
            .map(|s| s.customer_id)
            .collect();
        customers.sort();
        customers.dedup();
        Ok(customers)
    }

    async fn delete(&self, id: Uuid) -> AppResult<()> {
        self.state.lock().unwrap().subscriptions.remove(&id);
        Ok(())
    }

    async fn expire_ended_before(&self, date: NaiveDate) -> AppResult<u64> {
        let mut state = self.state.lock().unwrap();
        let mut count = 0;
        for sub in state.subscriptions.values_mut() {
            if sub.status == SubscriptionStatus::Active && sub.end_date < date {
                sub.status = SubscriptionStatus::Expired;
                count += 1;
            }
        }
        Ok(count)
    }
}

#[async_trait]
impl PauseRepo for InMemoryPersistence {
    async fn insert(&self, customer_id: Uuid, date: NaiveDate) -> AppResult<Pause> {
        let mut state = self.state.lock().unwrap();
        if state.pauses.contains_key(&(customer_id, date)) {
            return Err(AppError::DuplicatePause);
        }
        let pause = Pause {
            customer_id,
            pause_date: date,
            created_at: test_datetime(),
        };
        state.pauses.insert((customer_id, date), pause.clone());
        Ok(pause)
    }

    async fn delete(&self, customer_id: Uuid, date: NaiveDate) -> AppResult<bool> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .pauses
            .remove(&(customer_id, date))
            .is_some())
    }

    async fn exists(&self, customer_id: Uuid, date: NaiveDate) -> AppResult<bool> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .pauses
            .contains_key(&(customer_id, date)))
    }

    async fn count_in_range(&self, customer_id: Uuid, range: DateRange) -> AppResult<i64> {
        Ok(self.list_in_range(customer_id, range).await?.len() as i64)
    }

    async fn list_in_range(&self, customer_id: Uuid, range: DateRange) -> AppResult<Vec<Pause>> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .pauses
            .range((customer_id, range.start())..=(customer_id, range.end()))
            .map(|(_, p)| p.clone())
            .collect())
    }
}

#[async_trait]
impl BillRepo for InMemoryPersistence {
    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<Bill>> {
        Ok(self.state.lock().unwrap().bills.get(&id).cloned())
    }

    async fn get_by_period(
        &self,
        customer_id: Uuid,
        month: i32,
        year: i32,
    ) -> AppResult<Option<Bill>> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .bill_for_period(customer_id, month, year)
            .cloned())
    }

    async fn insert_if_absent(&self, new_bill: &NewBill) -> AppResult<Option<Bill>> {
        let mut state = self.state.lock().unwrap();
        if self.concurrent_bill_insert.swap(false, Ordering::SeqCst) {
            let winner = create_test_bill(new_bill.customer_id, |b| {
                b.month = new_bill.month;
                b.year = new_bill.year;
                b.total_days = new_bill.increment.total_days;
                b.paused_days = new_bill.increment.paused_days;
                b.billable_days = new_bill.increment.billable_days;
                b.amount = new_bill.increment.amount;
            });
            state.bills.insert(winner.id, winner);
        }
        if state
            .bill_for_period(new_bill.customer_id, new_bill.month, new_bill.year)
            .is_some()
        {
            return Ok(None);
        }
        let bill = create_test_bill(new_bill.customer_id, |b| {
            b.month = new_bill.month;
            b.year = new_bill.year;
            b.total_days = new_bill.increment.total_days;
            b.paused_days = new_bill.increment.paused_days;
            b.billable_days = new_bill.increment.billable_days;
            b.amount = new_bill.increment.amount;
        });
        state.bills.insert(bill.id, bill.clone());
        Ok(Some(bill))
    }

    async fn list_by_customer(&self, customer_id: Uuid) -> AppResult<Vec<Bill>> {
        let mut bills = self.bills_for(customer_id);
        bills.reverse();
        Ok(bills)
    }

    async fn list_unpaid(&self, customer_id: Uuid) -> AppResult<Vec<Bill>> {
        let mut bills = BillRepo::list_by_customer(self, customer_id).await?;
        bills.retain(|b| !b.is_paid);
        Ok(bills)
    }

    async fn mark_paid(&self, id: Uuid, paid_at: NaiveDateTime) -> AppResult<Option<Bill>> {
        let mut state = self.state.lock().unwrap();
        Ok(state
            .bills
            .get_mut(&id)
            .filter(|b| !b.is_paid)
            .map(|bill| {
                bill.is_paid = true;
                bill.paid_at = Some(paid_at);
                bill.updated_at = paid_at;
                bill.clone()
            }))
    }

    async fn merge_or_create(
        &self,
        customer_id: Uuid,
        month: i32,
        year: i32,
        increment: &BillIncrement,
        paid_at: NaiveDateTime,
    ) -> AppResult<Bill> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .merge_bill(customer_id, month, year, increment, paid_at))
    }
}

#[async_trait]
impl PaymentRepo for InMemoryPersistence {
    async fn exists_by_reference(&self, external_reference: &str) -> AppResult<bool> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .payments
            .contains_key(external_reference))
    }

    async fn settle_bill(&self, payment: &NewPayment, bill_id: Uuid) -> AppResult<Settled<Bill>> {
        let mut state = self.state.lock().unwrap();
        if state.payments.contains_key(&payment.external_reference) {
            return Ok(Settled::Duplicate);
        }
        if !state.bills.contains_key(&bill_id) {
            return Err(AppError::NotFound);
        }
        state.record_payment(payment);
        let bill = state.bills.get_mut(&bill_id).ok_or(AppError::NotFound)?;
        if !bill.is_paid {
            bill.is_paid = true;
            bill.paid_at = Some(payment.received_at);
            bill.updated_at = payment.received_at;
        }
        Ok(Settled::Applied(bill.clone()))
    }

    async fn settle_subscription(
        &self,
        payment: &NewPayment,
        activation: &SubscriptionActivation,
    ) -> AppResult<Activated> {
        let mut state = self.state.lock().unwrap();
        if state.payments.contains_key(&payment.external_reference) {
            return Ok(Activated::Duplicate);
        }
        let pending = state
            .subscriptions
            .get(&activation.subscription_id)
            .is_some_and(|s| s.status == SubscriptionStatus::PendingPayment);
        if !pending {
            return Err(AppError::Conflict(
                "Subscription is not awaiting payment".into(),
            ));
        }
        if !activation
            .replaced
            .iter()
            .all(|r| state.replacement_is_current(activation.customer_id, r))
        {
            return Ok(Activated::Stale);
        }

        state.record_payment(payment);
        if let Some(sub) = state.subscriptions.get_mut(&activation.subscription_id) {
            sub.status = SubscriptionStatus::Active;
        }
        for replaced in &activation.replaced {
            state.apply_replacement(activation.customer_id, replaced, payment.received_at);
        }

        let bills = activation
            .charges
            .iter()
            .map(|c| {
                state.merge_bill(
                    activation.customer_id,
                    c.month,
                    c.year,
                    &c.increment,
                    payment.received_at,
                )
            })
            .collect();
        Ok(Activated::Applied(bills))
    }
}

#[async_trait]
impl StorageHealth for InMemoryPersistence {
    async fn ping(&self) -> AppResult<()> {
        Ok(())
    }
}
