use std::net::SocketAddr;

use anyhow::Context;
use axum::http::HeaderValue;
use chrono::{FixedOffset, NaiveTime};
use env_helpers::{get_env, get_env_default};
use secrecy::SecretString;

pub struct AppConfig {
    pub database_url: String,
    pub bind_addr: SocketAddr,
    pub cors_origin: HeaderValue,
    pub db_max_connections: u32,
    /// Connection attempts at startup before giving up.
    pub db_connect_retries: u32,
    pub db_retry_backoff_ms: u64,
    /// Latest local time at which today's delivery can still be paused or resumed.
    pub pause_cutoff: NaiveTime,
    /// Offset of the kitchen's local time from UTC.
    pub local_offset: FixedOffset,
    pub sweep_interval_secs: u64,
    pub payment_webhook_secret: SecretString,
    /// Maximum accepted age of a signed webhook, in seconds.
    pub webhook_tolerance_secs: i64,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url: String = get_env("DATABASE_URL");
        let bind_addr: SocketAddr = get_env_default("BIND_ADDR", SocketAddr::from(([127, 0, 0, 1], 3001)));
        let cors_origin: HeaderValue =
            get_env_default("CORS_ORIGIN", String::from("http://localhost:3000"))
                .parse()
                .context("CORS_ORIGIN must be a valid header value")?;

        let db_max_connections: u32 = get_env_default("DB_MAX_CONNECTIONS", 5);
        let db_connect_retries: u32 = get_env_default("DB_CONNECT_RETRIES", 5);
        let db_retry_backoff_ms: u64 = get_env_default("DB_RETRY_BACKOFF_MS", 500);

        let cutoff_hour: u32 = get_env_default("PAUSE_CUTOFF_HOUR", 8);
        let pause_cutoff = NaiveTime::from_hms_opt(cutoff_hour, 0, 0)
            .context("PAUSE_CUTOFF_HOUR must be between 0 and 23")?;

        let offset_minutes: i32 = get_env_default("LOCAL_UTC_OFFSET_MINUTES", 330);
        let local_offset = FixedOffset::east_opt(offset_minutes * 60)
            .context("LOCAL_UTC_OFFSET_MINUTES is out of range")?;

        let sweep_interval_secs: u64 = get_env_default("SWEEP_INTERVAL_SECS", 3600);
        let payment_webhook_secret =
            SecretString::new(get_env::<String>("PAYMENT_WEBHOOK_SECRET").into());
        let webhook_tolerance_secs: i64 = get_env_default("WEBHOOK_TOLERANCE_SECS", 300);

        Ok(Self {
            database_url,
            bind_addr,
            cors_origin,
            db_max_connections,
            db_connect_retries,
            db_retry_backoff_ms,
            pause_cutoff,
            local_offset,
            sweep_interval_secs,
            payment_webhook_secret,
            webhook_tolerance_secs,
        })
    }
}
