use std::sync::Arc;

use crate::{
    application::ports::storage::StorageHealth,
    infra::config::AppConfig,
    use_cases::{
        billing::BillingUseCases, customer::CustomerUseCases, pause::PauseUseCases,
        payment::PaymentUseCases, plan::PlanUseCases, subscription::SubscriptionUseCases,
    },
};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub customer_use_cases: Arc<CustomerUseCases>,
    pub plan_use_cases: Arc<PlanUseCases>,
    pub subscription_use_cases: Arc<SubscriptionUseCases>,
    pub pause_use_cases: Arc<PauseUseCases>,
    pub billing_use_cases: Arc<BillingUseCases>,
    pub payment_use_cases: Arc<PaymentUseCases>,
    pub storage: Arc<dyn StorageHealth>,
}
