use anyhow::Result;
use async_trait::async_trait;
use contracts::domain::a002_sync_job::aggregate::{SyncJob, SyncJobType};

use crate::system::jobs::handler::JobHandler;
use crate::system::jobs::logger::JobLogger;
use crate::usecases::u102_product_sync;

/// Обновление уже выгруженных товаров
pub struct ProductUpdateHandler;

#[async_trait]
impl JobHandler for ProductUpdateHandler {
    fn job_type(&self) -> SyncJobType {
        SyncJobType::ProductUpdate
    }

    async fn run(&self, job: &SyncJob, logger: &JobLogger) -> Result<()> {
        u102_product_sync::run_product_job(job, logger).await
    }
}
