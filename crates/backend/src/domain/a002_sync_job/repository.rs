use anyhow::Context;
use chrono::{DateTime, Duration, Utc};
use contracts::domain::a001_connection::aggregate::ConnectionId;
use contracts::domain::a002_sync_job::aggregate::{
    SyncJob, SyncJobCounts, SyncJobId, SyncJobStatus, SyncJobType,
};
use contracts::domain::common::PageRequest;
use sea_orm::entity::prelude::*;
use sea_orm::sea_query::Expr;
use sea_orm::{Condition, QueryOrder, QuerySelect, Set};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::shared::data::db::get_connection;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "sync_jobs")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub connection_id: String,
    pub job_type: String,
    pub payload: String,
    pub status: String,
    pub attempts: i32,
    pub max_attempts: i32,
    pub error_message: Option<String>,
    pub scheduled_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for SyncJob {
    type Error = anyhow::Error;

    fn try_from(m: Model) -> Result<Self, Self::Error> {
        let job_type = SyncJobType::parse(&m.job_type)
            .ok_or_else(|| anyhow::anyhow!("Unknown job type '{}' in job {}", m.job_type, m.id))?;
        Ok(SyncJob {
            id: SyncJobId(Uuid::parse_str(&m.id)?),
            connection_id: ConnectionId(Uuid::parse_str(&m.connection_id)?),
            job_type,
            payload: serde_json::from_str(&m.payload)
                .with_context(|| format!("Unreadable payload in job {}", m.id))?,
            status: SyncJobStatus::parse(&m.status)
                .ok_or_else(|| anyhow::anyhow!("Unknown status '{}' in job {}", m.status, m.id))?,
            attempts: m.attempts,
            max_attempts: m.max_attempts,
            error_message: m.error_message,
            scheduled_at: m.scheduled_at,
            started_at: m.started_at,
            completed_at: m.completed_at,
            created_at: m.created_at,
        })
    }
}

fn conn() -> &'static DatabaseConnection {
    get_connection()
}

fn to_active(job: &SyncJob) -> ActiveModel {
    ActiveModel {
        id: Set(job.id.value().to_string()),
        connection_id: Set(job.connection_id.value().to_string()),
        job_type: Set(job.job_type.as_str().to_string()),
        payload: Set(job.payload.to_string()),
        status: Set(job.status.as_str().to_string()),
        attempts: Set(job.attempts),
        max_attempts: Set(job.max_attempts),
        error_message: Set(job.error_message.clone()),
        scheduled_at: Set(job.scheduled_at),
        started_at: Set(job.started_at),
        completed_at: Set(job.completed_at),
        created_at: Set(job.created_at),
    }
}

fn convert(models: Vec<Model>) -> anyhow::Result<Vec<SyncJob>> {
    models.into_iter().map(SyncJob::try_from).collect()
}

/// Строки, которые можно брать в работу: pending, срок наступил, попытки не исчерпаны
fn due_condition(now: DateTime<Utc>) -> Condition {
    Condition::all()
        .add(Column::Status.eq(SyncJobStatus::Pending.as_str()))
        .add(Column::ScheduledAt.lte(now))
        .add(Expr::col(Column::Attempts).lt(Expr::col(Column::MaxAttempts)))
}

pub async fn create(job: &SyncJob) -> anyhow::Result<SyncJobId> {
    to_active(job).insert(conn()).await?;
    Ok(job.id)
}

pub async fn get_by_id(id: SyncJobId) -> anyhow::Result<Option<SyncJob>> {
    Entity::find_by_id(id.value().to_string())
        .one(conn())
        .await?
        .map(SyncJob::try_from)
        .transpose()
}

pub async fn list_by_connection(
    connection_id: ConnectionId,
    status: Option<SyncJobStatus>,
    job_type: Option<SyncJobType>,
    page: PageRequest,
) -> anyhow::Result<(Vec<SyncJob>, u64)> {
    let mut query = Entity::find().filter(Column::ConnectionId.eq(connection_id.value().to_string()));
    if let Some(status) = status {
        query = query.filter(Column::Status.eq(status.as_str()));
    }
    if let Some(job_type) = job_type {
        query = query.filter(Column::JobType.eq(job_type.as_str()));
    }

    let paginator = query
        .order_by_desc(Column::CreatedAt)
        .paginate(conn(), page.page_size);
    let total = paginator.num_items().await?;
    let items = convert(paginator.fetch_page(page.index()).await?)?;
    Ok((items, total))
}

/// Due jobs ordered by `scheduled_at`. Unreadable rows (unknown job type,
/// broken payload) are failed in place so they never block the queue.
pub async fn get_pending_jobs(limit: u64) -> anyhow::Result<Vec<SyncJob>> {
    let models = Entity::find()
        .filter(due_condition(Utc::now()))
        .order_by_asc(Column::ScheduledAt)
        .limit(limit)
        .all(conn())
        .await?;

    let mut jobs = Vec::with_capacity(models.len());
    for model in models {
        let id = model.id.clone();
        match SyncJob::try_from(model) {
            Ok(job) => jobs.push(job),
            Err(e) => {
                tracing::warn!("Dropping unreadable sync job {}: {}", id, e);
                Entity::update_many()
                    .col_expr(Column::Status, Expr::value(SyncJobStatus::Failed.as_str()))
                    .col_expr(Column::Attempts, Expr::col(Column::MaxAttempts).into())
                    .col_expr(Column::ErrorMessage, Expr::value(e.to_string()))
                    .col_expr(Column::CompletedAt, Expr::value(Utc::now()))
                    .filter(Column::Id.eq(id))
                    .exec(conn())
                    .await?;
            }
        }
    }
    Ok(jobs)
}

/// Failed jobs of a connection that still have attempts left
pub async fn get_failed_jobs(connection_id: ConnectionId) -> anyhow::Result<Vec<SyncJob>> {
    convert(
        Entity::find()
            .filter(Column::ConnectionId.eq(connection_id.value().to_string()))
            .filter(Column::Status.eq(SyncJobStatus::Failed.as_str()))
            .filter(Expr::col(Column::Attempts).lt(Expr::col(Column::MaxAttempts)))
            .order_by_asc(Column::CreatedAt)
            .all(conn())
            .await?,
    )
}

pub async fn has_pending(connection_id: ConnectionId, job_type: SyncJobType) -> anyhow::Result<bool> {
    let count = Entity::find()
        .filter(Column::ConnectionId.eq(connection_id.value().to_string()))
        .filter(Column::JobType.eq(job_type.as_str()))
        .filter(Column::Status.is_in([
            SyncJobStatus::Pending.as_str(),
            SyncJobStatus::Processing.as_str(),
        ]))
        .count(conn())
        .await?;
    Ok(count > 0)
}

pub async fn update(job: &SyncJob) -> anyhow::Result<()> {
    to_active(job).update(conn()).await?;
    Ok(())
}

/// pending -> processing, `attempts += 1`. Returns false when the row was
/// already taken.
pub async fn mark_processing(id: SyncJobId) -> anyhow::Result<bool> {
    let result = Entity::update_many()
        .col_expr(Column::Status, Expr::value(SyncJobStatus::Processing.as_str()))
        .col_expr(Column::StartedAt, Expr::value(Utc::now()))
        .col_expr(Column::Attempts, Expr::col(Column::Attempts).add(1))
        .filter(Column::Id.eq(id.value().to_string()))
        .filter(Column::Status.eq(SyncJobStatus::Pending.as_str()))
        .exec(conn())
        .await?;
    Ok(result.rows_affected > 0)
}

pub async fn mark_completed(id: SyncJobId) -> anyhow::Result<()> {
    Entity::update_many()
        .col_expr(Column::Status, Expr::value(SyncJobStatus::Completed.as_str()))
        .col_expr(Column::CompletedAt, Expr::value(Utc::now()))
        .col_expr(Column::ErrorMessage, Expr::value(Option::<String>::None))
        .filter(Column::Id.eq(id.value().to_string()))
        .exec(conn())
        .await?;
    Ok(())
}

/// `completed_at` records when the attempt failed; the retry delay counts from it.
pub async fn mark_failed(id: SyncJobId, error: &str) -> anyhow::Result<()> {
    Entity::update_many()
        .col_expr(Column::Status, Expr::value(SyncJobStatus::Failed.as_str()))
        .col_expr(Column::CompletedAt, Expr::value(Utc::now()))
        .col_expr(Column::ErrorMessage, Expr::value(error))
        .filter(Column::Id.eq(id.value().to_string()))
        .exec(conn())
        .await?;
    Ok(())
}

/// Retryable failures that failed before `older_than` go back to pending.
pub async fn requeue_failed(older_than: DateTime<Utc>, retry_at: DateTime<Utc>) -> anyhow::Result<u64> {
    let result = Entity::update_many()
        .col_expr(Column::Status, Expr::value(SyncJobStatus::Pending.as_str()))
        .col_expr(Column::ScheduledAt, Expr::value(retry_at))
        .col_expr(Column::StartedAt, Expr::value(Option::<DateTime<Utc>>::None))
        .col_expr(Column::CompletedAt, Expr::value(Option::<DateTime<Utc>>::None))
        .filter(Column::Status.eq(SyncJobStatus::Failed.as_str()))
        .filter(Expr::col(Column::Attempts).lt(Expr::col(Column::MaxAttempts)))
        .filter(
            Condition::any()
                .add(Column::CompletedAt.is_null())
                .add(Column::CompletedAt.lte(older_than)),
        )
        .exec(conn())
        .await?;
    Ok(result.rows_affected)
}

/// Outcome of [`requeue_stale_processing`]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct StaleRecovery {
    pub requeued: u64,
    pub failed: u64,
}

pub const LOST_JOB_ERROR: &str = "Worker stopped during the final attempt";

fn stale_condition(older_than: DateTime<Utc>) -> Condition {
    Condition::all()
        .add(Column::Status.eq(SyncJobStatus::Processing.as_str()))
        .add(
            Condition::any()
                .add(Column::StartedAt.is_null())
                .add(Column::StartedAt.lt(older_than)),
        )
}

/// Jobs left in `processing` since before `older_than` (crashed worker).
/// Jobs with attempts left go back to pending, the rest end failed.
pub async fn requeue_stale_processing(older_than: DateTime<Utc>) -> anyhow::Result<StaleRecovery> {
    let now = Utc::now();
    let requeued = Entity::update_many()
        .col_expr(Column::Status, Expr::value(SyncJobStatus::Pending.as_str()))
        .col_expr(Column::StartedAt, Expr::value(Option::<DateTime<Utc>>::None))
        .col_expr(Column::ScheduledAt, Expr::value(now))
        .filter(stale_condition(older_than))
        .filter(Expr::col(Column::Attempts).lt(Expr::col(Column::MaxAttempts)))
        .exec(conn())
        .await?;

    let failed = Entity::update_many()
        .col_expr(Column::Status, Expr::value(SyncJobStatus::Failed.as_str()))
        .col_expr(Column::ErrorMessage, Expr::value(LOST_JOB_ERROR))
        .col_expr(Column::CompletedAt, Expr::value(now))
        .filter(stale_condition(older_than))
        .filter(Expr::col(Column::Attempts).gte(Expr::col(Column::MaxAttempts)))
        .exec(conn())
        .await?;

    Ok(StaleRecovery {
        requeued: requeued.rows_affected,
        failed: failed.rows_affected,
    })
}

pub async fn delete(id: SyncJobId) -> anyhow::Result<bool> {
    let result = Entity::delete_by_id(id.value().to_string())
        .exec(conn())
        .await?;
    Ok(result.rows_affected > 0)
}

pub async fn delete_old_completed(hours: i64) -> anyhow::Result<u64> {
    let cutoff = Utc::now() - Duration::hours(hours);
    let result = Entity::delete_many()
        .filter(Column::Status.eq(SyncJobStatus::Completed.as_str()))
        .filter(Column::CompletedAt.lt(cutoff))
        .exec(conn())
        .await?;
    Ok(result.rows_affected)
}

pub async fn count_by_status(connection_id: ConnectionId) -> anyhow::Result<SyncJobCounts> {
    let mut counts = SyncJobCounts::default();
    for status in SyncJobStatus::all() {
        let n = Entity::find()
            .filter(Column::ConnectionId.eq(connection_id.value().to_string()))
            .filter(Column::Status.eq(status.as_str()))
            .count(conn())
            .await?;
        match status {
            SyncJobStatus::Pending => counts.pending = n,
            SyncJobStatus::Processing => counts.processing = n,
            SyncJobStatus::Completed => counts.completed = n,
            SyncJobStatus::Failed => counts.failed = n,
        }
    }
    Ok(counts)
}
