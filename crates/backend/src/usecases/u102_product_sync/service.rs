use contracts::domain::a001_connection::aggregate::ConnectionId;
use contracts::domain::a002_sync_job::aggregate::{ProductPushPayload, SyncJob, SyncJobType};
use contracts::domain::a003_product_mapping::aggregate::{
    MappingSyncStatus, ProductMapping, ProductMappingFilter, ProductMappingId,
};
use contracts::domain::common::Paged;
use uuid::Uuid;

use crate::domain::a002_sync_job::service as job_service;
use crate::domain::a003_product_mapping::service as mapping_service;
use crate::usecases::invalid;
use crate::usecases::u101_connect_marketplace::load_active;

async fn enqueue(
    connection_id: ConnectionId,
    job_type: SyncJobType,
    product_ids: Vec<Uuid>,
    category_mapping_id: Option<Uuid>,
) -> anyhow::Result<SyncJob> {
    if product_ids.is_empty() {
        return Err(invalid("product_ids must not be empty"));
    }
    load_active(connection_id).await?;

    let payload = ProductPushPayload {
        internal_product_ids: product_ids,
        category_mapping_id,
    };
    job_service::enqueue(connection_id, job_type, &payload).await
}

/// Ставит в очередь выгрузку товаров на маркетплейс
pub async fn push_products(
    connection_id: ConnectionId,
    product_ids: Vec<Uuid>,
    category_mapping_id: Option<Uuid>,
) -> anyhow::Result<SyncJob> {
    enqueue(connection_id, SyncJobType::ProductPush, product_ids, category_mapping_id).await
}

/// Ставит в очередь обновление уже выгруженных товаров
pub async fn update_products(connection_id: ConnectionId, product_ids: Vec<Uuid>) -> anyhow::Result<SyncJob> {
    enqueue(connection_id, SyncJobType::ProductUpdate, product_ids, None).await
}

pub async fn mapped_products(
    connection_id: ConnectionId,
    filter: &ProductMappingFilter,
) -> anyhow::Result<Paged<ProductMapping>> {
    mapping_service::list(connection_id, filter).await
}

/// Returns false when the mapping does not exist or belongs to another connection.
pub async fn update_mapping_status(
    connection_id: ConnectionId,
    mapping_id: ProductMappingId,
    status: &str,
) -> anyhow::Result<bool> {
    let status = MappingSyncStatus::parse(status).ok_or_else(|| {
        invalid(format!(
            "Invalid status '{}': expected synced, pending or error",
            status
        ))
    })?;
    match mapping_service::get_by_id(mapping_id).await? {
        Some(m) if m.connection_id == connection_id => mapping_service::set_status(mapping_id, status).await,
        _ => Ok(false),
    }
}

pub async fn delete_mapping(connection_id: ConnectionId, mapping_id: ProductMappingId) -> anyhow::Result<bool> {
    match mapping_service::get_by_id(mapping_id).await? {
        Some(m) if m.connection_id == connection_id => mapping_service::delete(mapping_id).await,
        _ => Ok(false),
    }
}
