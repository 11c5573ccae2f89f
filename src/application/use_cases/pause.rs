use std::sync::Arc;

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    app_error::{AppError, AppResult},
    application::ports::clock::Clock,
    domain::{calendar::DateRange, entities::pause::Pause},
};

#[async_trait]
pub trait PauseRepo: Send + Sync {
    /// Fails with `DuplicatePause` if the day is already paused.
    async fn insert(&self, customer_id: Uuid, date: NaiveDate) -> AppResult<Pause>;
    /// Returns false when there was nothing to delete.
    async fn delete(&self, customer_id: Uuid, date: NaiveDate) -> AppResult<bool>;
    async fn exists(&self, customer_id: Uuid, date: NaiveDate) -> AppResult<bool>;
    async fn count_in_range(&self, customer_id: Uuid, range: DateRange) -> AppResult<i64>;
    async fn list_in_range(&self, customer_id: Uuid, range: DateRange) -> AppResult<Vec<Pause>>;
}

#[derive(Clone)]
pub struct PauseUseCases {
    repo: Arc<dyn PauseRepo>,
    clock: Arc<dyn Clock>,
    cutoff: NaiveTime,
}

impl PauseUseCases {
    pub fn new(repo: Arc<dyn PauseRepo>, clock: Arc<dyn Clock>, cutoff: NaiveTime) -> Self {
        Self {
            repo,
            clock,
            cutoff,
        }
    }

    #[instrument(skip(self))]
    pub async fn add_pause(&self, customer_id: Uuid, date: NaiveDate) -> AppResult<Pause> {
        check_change_allowed(date, self.clock.now(), self.cutoff)?;

        if self.repo.exists(customer_id, date).await? {
            return Err(AppError::DuplicatePause);
        }

        let pause = self.repo.insert(customer_id, date).await?;
        info!(%customer_id, %date, "Delivery paused");
        Ok(pause)
    }

    #[instrument(skip(self))]
    pub async fn remove_pause(&self, customer_id: Uuid, date: NaiveDate) -> AppResult<()> {
        check_change_allowed(date, self.clock.now(), self.cutoff)?;

        if !self.repo.delete(customer_id, date).await? {
            return Err(AppError::PauseNotFound);
        }
        info!(%customer_id, %date, "Delivery resumed");
        Ok(())
    }

    pub async fn is_paused(&self, customer_id: Uuid, date: NaiveDate) -> AppResult<bool> {
        self.repo.exists(customer_id, date).await
    }

    pub async fn count_paused(&self, customer_id: Uuid, range: DateRange) -> AppResult<i64> {
        self.repo.count_in_range(customer_id, range).await
    }

    pub async fn list_pauses(&self, customer_id: Uuid, range: DateRange) -> AppResult<Vec<Pause>> {
        self.repo.list_in_range(customer_id, range).await
    }
}

/// Pauses can be placed or lifted for today until the cutoff (inclusive) and
/// for any later day at any time.
pub fn check_change_allowed(
    date: NaiveDate,
    now: NaiveDateTime,
    cutoff: NaiveTime,
) -> AppResult<()> {
    let today = now.date();
    if date < today {
        return Err(AppError::PastDate);
    }
    if date == today && now.time() > cutoff {
        return Err(AppError::CutoffExceeded { cutoff });
    }
    Ok(())
}
