use std::sync::Arc;
use std::time::Duration;

use tokio::time::interval;
use tracing::{error, info};

use crate::use_cases::subscription::SubscriptionUseCases;

/// Periodically moves lapsed active subscriptions to expired.
pub async fn run_subscription_sweep_loop(
    subscription_use_cases: Arc<SubscriptionUseCases>,
    every: Duration,
) {
    let mut ticker = interval(every);

    info!(
        "Subscription sweeper started (running every {}s)",
        every.as_secs()
    );

    loop {
        ticker.tick().await;

        if let Err(e) = subscription_use_cases.sweep_expired().await {
            error!(error = ?e, "Subscription sweep failed");
        }
    }
}
