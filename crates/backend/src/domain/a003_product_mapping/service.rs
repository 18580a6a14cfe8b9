use super::repository;
use contracts::domain::a001_connection::aggregate::ConnectionId;
use contracts::domain::a003_product_mapping::aggregate::{
    MappingSyncStatus, ProductMapping, ProductMappingFilter, ProductMappingId, VariantMapping,
};
use contracts::domain::common::Paged;
use uuid::Uuid;

use crate::shared::marketplaces::types::VariantMappingResult;

/// Сохраняет результат успешной выгрузки: создаёт сопоставление или
/// обновляет существующее, заменяя сопоставления вариантов.
///
/// `variants` pairs the internal variant id with what the marketplace
/// returned for its SKU.
pub async fn record_synced(
    connection_id: ConnectionId,
    internal_product_id: Uuid,
    external_product_id: &str,
    external_sku: &str,
    variants: &[(Uuid, VariantMappingResult)],
) -> anyhow::Result<ProductMapping> {
    let existing =
        repository::get_by_connection_and_internal_id(connection_id, internal_product_id).await?;

    let mut mapping = match existing {
        Some(mut m) => {
            if !external_product_id.is_empty() {
                m.external_product_id = external_product_id.to_string();
            }
            if !external_sku.is_empty() {
                m.external_sku = external_sku.to_string();
            }
            m.apply_sync_status(MappingSyncStatus::Synced, None);
            m.validate()
                .map_err(|e| anyhow::anyhow!("Validation failed: {}", e))?;
            repository::update(&m).await?;
            m
        }
        None => {
            let m = ProductMapping::new_for_insert(
                connection_id,
                internal_product_id,
                external_product_id.to_string(),
                external_sku.to_string(),
            );
            m.validate()
                .map_err(|e| anyhow::anyhow!("Validation failed: {}", e))?;
            repository::create(&m).await?;
            m
        }
    };

    if !variants.is_empty() {
        repository::delete_variants(mapping.id).await?;
        mapping.variant_mappings.clear();
        for (internal_variant_id, v) in variants {
            let vm = VariantMapping::new_for_insert(
                mapping.id,
                *internal_variant_id,
                v.external_sku.clone(),
                v.external_sku.clone(),
            );
            repository::create_variant(&vm).await?;
            mapping.variant_mappings.push(vm);
        }
    }
    Ok(mapping)
}

/// Помечает существующее сопоставление ошибкой. Без сопоставления ошибка
/// только логируется.
pub async fn record_error(
    connection_id: ConnectionId,
    internal_product_id: Uuid,
    error: &str,
) -> anyhow::Result<()> {
    match repository::get_by_connection_and_internal_id(connection_id, internal_product_id).await? {
        Some(m) => {
            repository::update_sync_status(m.id, MappingSyncStatus::Error, Some(error.to_string()))
                .await?;
        }
        None => {
            tracing::warn!(
                "Product {} failed on connection {} before any mapping existed: {}",
                internal_product_id,
                connection_id,
                error
            );
        }
    }
    Ok(())
}

pub async fn list(
    connection_id: ConnectionId,
    filter: &ProductMappingFilter,
) -> anyhow::Result<Paged<ProductMapping>> {
    let (items, total) = repository::list_by_connection(connection_id, filter).await?;
    Ok(Paged::new(items, total, filter.page_request()))
}

pub async fn get_by_id(id: ProductMappingId) -> anyhow::Result<Option<ProductMapping>> {
    repository::get_by_id(id).await
}

/// Ручная смена статуса
pub async fn set_status(id: ProductMappingId, status: MappingSyncStatus) -> anyhow::Result<bool> {
    repository::update_sync_status(id, status, None).await
}

pub async fn delete(id: ProductMappingId) -> anyhow::Result<bool> {
    repository::delete(id).await
}
