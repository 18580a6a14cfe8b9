use anyhow::Result;
use async_trait::async_trait;
use contracts::domain::a002_sync_job::aggregate::{SyncJob, SyncJobType};

use crate::system::jobs::handler::JobHandler;
use crate::system::jobs::logger::JobLogger;
use crate::usecases::u103_inventory_sync;

/// Пакетная выгрузка остатков
pub struct InventorySyncHandler;

#[async_trait]
impl JobHandler for InventorySyncHandler {
    fn job_type(&self) -> SyncJobType {
        SyncJobType::InventorySync
    }

    async fn run(&self, job: &SyncJob, logger: &JobLogger) -> Result<()> {
        u103_inventory_sync::executor::run_inventory_job(job, logger).await
    }
}
