use crate::{
    adapters::http::app_state::AppState,
    application::ports::clock::{Clock, SystemClock},
    infra::{config::AppConfig, postgres_persistence},
    use_cases::{
        billing::BillingUseCases, customer::CustomerUseCases, pause::PauseUseCases,
        payment::PaymentUseCases, plan::PlanUseCases, subscription::SubscriptionUseCases,
    },
};
use std::fs::File;
use std::sync::Arc;
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

pub async fn init_app_state() -> anyhow::Result<AppState> {
    let config = AppConfig::from_env()?;

    let postgres_arc = Arc::new(postgres_persistence(&config).await?);
    let clock: Arc<dyn Clock> = Arc::new(SystemClock::new(config.local_offset));

    let customer_use_cases = CustomerUseCases::new(postgres_arc.clone());
    let plan_use_cases = PlanUseCases::new(postgres_arc.clone());
    let subscription_use_cases = SubscriptionUseCases::new(
        postgres_arc.clone(),
        postgres_arc.clone(),
        postgres_arc.clone(),
        clock.clone(),
    );
    let pause_use_cases =
        PauseUseCases::new(postgres_arc.clone(), clock.clone(), config.pause_cutoff);
    let billing_use_cases = BillingUseCases::new(
        postgres_arc.clone(),
        postgres_arc.clone(),
        postgres_arc.clone(),
        clock.clone(),
    );
    let payment_use_cases = PaymentUseCases::new(
        postgres_arc.clone(),
        postgres_arc.clone(),
        postgres_arc.clone(),
        postgres_arc.clone(),
        clock,
    );

    Ok(AppState {
        config: Arc::new(config),
        customer_use_cases: Arc::new(customer_use_cases),
        plan_use_cases: Arc::new(plan_use_cases),
        subscription_use_cases: Arc::new(subscription_use_cases),
        pause_use_cases: Arc::new(pause_use_cases),
        billing_use_cases: Arc::new(billing_use_cases),
        payment_use_cases: Arc::new(payment_use_cases),
        storage: postgres_arc,
    })
}

pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "tiffin=debug,tower_http=debug".into());

    // Console (pretty logs)
    let console_layer = fmt::layer()
        .with_target(false) // don't show target (module path)
        .with_level(true) // show log level
        .pretty(); // human-friendly, with colors

    // File (structured JSON logs), skipped when the working dir is read-only
    let json_layer = match File::create("app.log") {
        Ok(file) => Some(
            fmt::layer()
                .json()
                .with_writer(file)
                .with_current_span(true)
                .with_span_list(true)
                .boxed(),
        ),
        Err(e) => {
            eprintln!("cannot create log file, JSON logging disabled: {e}");
            None
        }
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(json_layer)
        .try_init()
        .ok();
}
