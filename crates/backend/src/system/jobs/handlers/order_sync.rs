use anyhow::Result;
use async_trait::async_trait;
use contracts::domain::a002_sync_job::aggregate::{SyncJob, SyncJobType};

use crate::system::jobs::handler::JobHandler;
use crate::system::jobs::logger::JobLogger;
use crate::usecases::u104_order_sync;

/// Импорт заказа во внутренний сервис заказов или смена статуса
pub struct OrderSyncHandler;

#[async_trait]
impl JobHandler for OrderSyncHandler {
    fn job_type(&self) -> SyncJobType {
        SyncJobType::OrderSync
    }

    async fn run(&self, job: &SyncJob, logger: &JobLogger) -> Result<()> {
        u104_order_sync::executor::run_order_job(job, logger).await
    }
}
