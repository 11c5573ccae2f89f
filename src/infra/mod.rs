use crate::{adapters::persistence::PostgresPersistence, infra::config::AppConfig, infra::db::init_db};

pub mod app;
pub mod config;
pub mod db;
pub mod setup;
pub mod subscription_sweeper;
pub mod webhook_signature;

pub async fn postgres_persistence(config: &AppConfig) -> anyhow::Result<PostgresPersistence> {
    let pool = init_db(config).await?;
    let persistence = PostgresPersistence::new(pool);
    Ok(persistence)
}
