use dotenvy::dotenv;
use tracing::info;

use std::net::SocketAddr;
use std::time::Duration;
use tiffin::infra::{
    app::create_app,
    setup::{init_app_state, init_tracing},
    subscription_sweeper::run_subscription_sweep_loop,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    // Before the state is built so database retries are logged.
    init_tracing();

    let app_state = init_app_state().await?;

    let bind_addr = app_state.config.bind_addr;
    let sweep_every = Duration::from_secs(app_state.config.sweep_interval_secs.max(1));

    let app = create_app(app_state.clone());

    // Spawn the expiry sweeper
    let subscription_use_cases = app_state.subscription_use_cases.clone();
    tokio::spawn(async move {
        run_subscription_sweep_loop(subscription_use_cases, sweep_every).await;
    });

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;

    info!("Backend listening at {}", &listener.local_addr()?);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
