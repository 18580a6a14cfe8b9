use anyhow::Result;
use async_trait::async_trait;
use contracts::domain::a002_sync_job::aggregate::{SyncJob, SyncJobType};

use super::logger::JobLogger;

/// Исполнитель заданий одного типа
#[async_trait]
pub trait JobHandler: Send + Sync {
    fn job_type(&self) -> SyncJobType;

    async fn run(&self, job: &SyncJob, logger: &JobLogger) -> Result<()>;
}
