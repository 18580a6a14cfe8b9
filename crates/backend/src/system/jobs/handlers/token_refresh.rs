use anyhow::Result;
use async_trait::async_trait;
use contracts::domain::a002_sync_job::aggregate::{SyncJob, SyncJobType};

use crate::system::jobs::handler::JobHandler;
use crate::system::jobs::logger::JobLogger;
use crate::usecases::u101_connect_marketplace;

/// Обновление access token подключения
pub struct TokenRefreshHandler;

#[async_trait]
impl JobHandler for TokenRefreshHandler {
    fn job_type(&self) -> SyncJobType {
        SyncJobType::TokenRefresh
    }

    async fn run(&self, job: &SyncJob, logger: &JobLogger) -> Result<()> {
        let refreshed = u101_connect_marketplace::refresh_token(job.connection_id).await?;
        match refreshed.token_expires_at {
            Some(expires) => logger.log(job.id, &format!("Token refreshed, expires at {}", expires)),
            None => logger.log(job.id, "Token refreshed"),
        }
        Ok(())
    }
}
