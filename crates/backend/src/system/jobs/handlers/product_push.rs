use anyhow::Result;
use async_trait::async_trait;
use contracts::domain::a002_sync_job::aggregate::{SyncJob, SyncJobType};

use crate::system::jobs::handler::JobHandler;
use crate::system::jobs::logger::JobLogger;
use crate::usecases::u102_product_sync;

/// Выгрузка новых товаров на маркетплейс
pub struct ProductPushHandler;

#[async_trait]
impl JobHandler for ProductPushHandler {
    fn job_type(&self) -> SyncJobType {
        SyncJobType::ProductPush
    }

    async fn run(&self, job: &SyncJob, logger: &JobLogger) -> Result<()> {
        u102_product_sync::run_product_job(job, logger).await
    }
}
