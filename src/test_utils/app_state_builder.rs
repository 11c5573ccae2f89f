//! Test app state builder for HTTP-level testing.
//!
//! `TestAppStateBuilder` wires every use case to one `InMemoryPersistence`
//! and a fixed clock.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::http::HeaderValue;
use chrono::{FixedOffset, NaiveDateTime, NaiveTime};
use secrecy::SecretString;

use crate::{
    adapters::http::app_state::AppState,
    infra::config::AppConfig,
    test_utils::{FixedClock, InMemoryPersistence, test_datetime},
    use_cases::{
        billing::BillingUseCases, customer::CustomerUseCases, pause::PauseUseCases,
        payment::PaymentUseCases, plan::PlanUseCases, subscription::SubscriptionUseCases,
    },
};

pub const TEST_WEBHOOK_SECRET: &str = "whsec_test_secret";

/// # Example
///
/// ```ignore
/// let store = Arc::new(InMemoryPersistence::new());
/// let app_state = TestAppStateBuilder::new()
///     .with_store(store.clone())
///     .with_now(test_datetime())
///     .build();
/// ```
pub struct TestAppStateBuilder {
    store: Arc<InMemoryPersistence>,
    now: NaiveDateTime,
}

impl TestAppStateBuilder {
    pub fn new() -> Self {
        Self {
            store: Arc::new(InMemoryPersistence::new()),
            now: test_datetime(),
        }
    }

    /// Share a store with the test so it can seed data and inspect results.
    pub fn with_store(mut self, store: Arc<InMemoryPersistence>) -> Self {
        self.store = store;
        self
    }

    /// Local wall-clock time seen by the use cases.
    pub fn with_now(mut self, now: NaiveDateTime) -> Self {
        self.now = now;
        self
    }

    pub fn build(self) -> AppState {
        let config = test_config();
        let store = self.store;
        let clock = Arc::new(FixedClock::new(self.now));

        AppState {
            customer_use_cases: Arc::new(CustomerUseCases::new(store.clone())),
            plan_use_cases: Arc::new(PlanUseCases::new(store.clone())),
            subscription_use_cases: Arc::new(SubscriptionUseCases::new(
                store.clone(),
                store.clone(),
                store.clone(),
                clock.clone(),
            )),
            pause_use_cases: Arc::new(PauseUseCases::new(
                store.clone(),
                clock.clone(),
                config.pause_cutoff,
            )),
            billing_use_cases: Arc::new(BillingUseCases::new(
                store.clone(),
                store.clone(),
                store.clone(),
                clock.clone(),
            )),
            payment_use_cases: Arc::new(PaymentUseCases::new(
                store.clone(),
                store.clone(),
                store.clone(),
                store.clone(),
                clock,
            )),
            storage: store,
            config: Arc::new(config),
        }
    }
}

impl Default for TestAppStateBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn test_config() -> AppConfig {
    AppConfig {
        database_url: String::new(),
        bind_addr: SocketAddr::from(([127, 0, 0, 1], 3001)),
        cors_origin: HeaderValue::from_static("http://localhost:3000"),
        db_max_connections: 1,
        db_connect_retries: 0,
        db_retry_backoff_ms: 0,
        pause_cutoff: NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
        local_offset: FixedOffset::east_opt(330 * 60).unwrap(),
        sweep_interval_secs: 3600,
        payment_webhook_secret: SecretString::new(TEST_WEBHOOK_SECRET.into()),
        webhook_tolerance_secs: 300,
    }
}
