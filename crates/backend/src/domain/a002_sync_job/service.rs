use super::repository;
use chrono::Utc;
use contracts::domain::a001_connection::aggregate::ConnectionId;
use contracts::domain::a002_sync_job::aggregate::{
    SyncJob, SyncJobFilter, SyncJobId, SyncJobStatus, SyncJobType,
};
use contracts::domain::common::{PageRequest, Paged};
use serde::Serialize;

/// Постановка задания в очередь
pub async fn enqueue<P: Serialize>(
    connection_id: ConnectionId,
    job_type: SyncJobType,
    payload: &P,
) -> anyhow::Result<SyncJob> {
    let job = SyncJob::new(connection_id, job_type, serde_json::to_value(payload)?);
    repository::create(&job).await?;
    tracing::info!(
        "Queued {} job {} for connection {}",
        job.job_type,
        job.id,
        connection_id
    );
    Ok(job)
}

pub async fn get_by_id(id: SyncJobId) -> anyhow::Result<Option<SyncJob>> {
    repository::get_by_id(id).await
}

pub async fn list_by_connection(
    connection_id: ConnectionId,
    filter: &SyncJobFilter,
) -> anyhow::Result<Paged<SyncJob>> {
    let page = PageRequest::new(filter.page, filter.page_size);
    let (items, total) =
        repository::list_by_connection(connection_id, filter.status, filter.job_type, page).await?;
    Ok(Paged::new(items, total, page))
}

/// Немедленный перезапуск упавших заданий, у которых остались попытки
pub async fn retry_failed(connection_id: ConnectionId) -> anyhow::Result<usize> {
    let jobs = repository::get_failed_jobs(connection_id).await?;
    let count = jobs.len();
    for mut job in jobs {
        job.status = SyncJobStatus::Pending;
        job.scheduled_at = Utc::now();
        job.started_at = None;
        job.completed_at = None;
        repository::update(&job).await?;
    }
    Ok(count)
}
