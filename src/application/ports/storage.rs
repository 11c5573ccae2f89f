use async_trait::async_trait;

use crate::app_error::AppResult;

#[async_trait]
pub trait StorageHealth: Send + Sync {
    async fn ping(&self) -> AppResult<()>;
}
