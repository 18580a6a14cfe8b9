use axum::{
    extract::{Path, Query},
    Json,
};
use contracts::domain::a001_connection::aggregate::ConnectionId;
use contracts::domain::a002_sync_job::aggregate::{SyncJob, SyncJobFilter, SyncJobId};
use serde_json::{json, Value};

use super::{api_error, not_found, parse_uuid, ApiResult};
use crate::domain::a002_sync_job::service as job_service;
use crate::system::jobs::logger::job_logger;

/// GET /connections/:id/jobs
pub async fn list(
    Path(id): Path<String>,
    Query(filter): Query<SyncJobFilter>,
) -> ApiResult<Json<Value>> {
    let connection_id = ConnectionId::new(parse_uuid(&id)?);
    let page = job_service::list_by_connection(connection_id, &filter)
        .await
        .map_err(api_error)?;
    Ok(Json(json!({
        "jobs": page.items,
        "total": page.total,
        "page": page.page,
        "page_size": page.page_size,
    })))
}

/// GET /jobs/:id
pub async fn get_by_id(Path(id): Path<String>) -> ApiResult<Json<SyncJob>> {
    let id = SyncJobId::new(parse_uuid(&id)?);
    match job_service::get_by_id(id).await.map_err(api_error)? {
        Some(job) => Ok(Json(job)),
        None => Err(not_found("Job")),
    }
}

/// GET /jobs/:id/log
pub async fn get_log(Path(id): Path<String>) -> ApiResult<Json<Value>> {
    let id = SyncJobId::new(parse_uuid(&id)?);
    if job_service::get_by_id(id).await.map_err(api_error)?.is_none() {
        return Err(not_found("Job"));
    }
    let log = job_logger().read_log(id).map_err(api_error)?;
    Ok(Json(json!({
        "job_id": id,
        "log": log.unwrap_or_default(),
    })))
}

/// POST /connections/:id/jobs/retry
pub async fn retry_failed(Path(id): Path<String>) -> ApiResult<Json<Value>> {
    let connection_id = ConnectionId::new(parse_uuid(&id)?);
    let requeued = job_service::retry_failed(connection_id)
        .await
        .map_err(api_error)?;
    Ok(Json(json!({
        "message": "Failed jobs requeued",
        "requeued": requeued,
    })))
}
