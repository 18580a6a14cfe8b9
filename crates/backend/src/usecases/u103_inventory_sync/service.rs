use contracts::domain::a001_connection::aggregate::ConnectionId;
use contracts::domain::a002_sync_job::aggregate::{InventorySyncPayload, SyncJobType};
use contracts::events::StockChangedEvent;

use crate::domain::a001_connection::service as connection_service;
use crate::domain::a002_sync_job::service as job_service;
use crate::domain::a003_product_mapping::repository as mapping_repository;
use crate::shared::marketplaces::types::{InventoryItem, InventoryUpdate, InventoryUpdateResult};
use crate::usecases::invalid;
use crate::usecases::u101_connect_marketplace::{access_for, load_active};

pub fn validate_updates(updates: &[InventoryUpdate]) -> anyhow::Result<()> {
    if updates.is_empty() {
        return Err(invalid("updates must not be empty"));
    }
    if let Some(bad) = updates.iter().find(|u| u.external_product_id.trim().is_empty()) {
        return Err(invalid(format!(
            "external_product_id is required (sku '{}')",
            bad.external_sku
        )));
    }
    if let Some(bad) = updates.iter().find(|u| u.quantity < 0) {
        return Err(invalid(format!(
            "quantity must be >= 0 for product {}",
            bad.external_product_id
        )));
    }
    Ok(())
}

/// Прямая выгрузка остатков, без очереди. Результат по каждой позиции.
pub async fn push_inventory(
    connection_id: ConnectionId,
    updates: &[InventoryUpdate],
) -> anyhow::Result<Vec<InventoryUpdateResult>> {
    validate_updates(updates)?;
    let connection = load_active(connection_id).await?;
    let (provider, token) = access_for(&connection)?;

    let results = provider
        .update_inventory(&token, &connection.shop_id, updates)
        .await?;
    let ok = results.iter().filter(|r| r.success).count();
    tracing::info!(
        "Inventory push to {} shop {}: {}/{} updated",
        connection.platform,
        connection.shop_id,
        ok,
        results.len()
    );
    Ok(results)
}

pub async fn inventory_status(
    connection_id: ConnectionId,
    external_product_ids: &[String],
) -> anyhow::Result<Vec<InventoryItem>> {
    if external_product_ids.is_empty() {
        return Err(invalid("product_ids must not be empty"));
    }
    let connection = load_active(connection_id).await?;
    let (provider, token) = access_for(&connection)?;
    Ok(provider
        .inventory(&token, &connection.shop_id, external_product_ids)
        .await?)
}

/// Изменение остатка во внутренней системе: задание `inventory_sync` для
/// каждого активного подключения, где товар сопоставлен.
pub async fn handle_stock_changed(event: StockChangedEvent) -> anyhow::Result<()> {
    let mappings = mapping_repository::list_by_internal_product(event.product_id).await?;
    if mappings.is_empty() {
        tracing::debug!("Product {} is not mapped on any marketplace", event.product_id);
        return Ok(());
    }

    let payload = InventorySyncPayload {
        internal_product_id: event.product_id,
        new_quantity: event.new_quantity.max(0),
        warehouse_id: event.warehouse_id.clone(),
    };
    for mapping in mappings {
        let active = connection_service::get_by_id(mapping.connection_id)
            .await?
            .map(|c| c.is_active)
            .unwrap_or(false);
        if !active {
            continue;
        }
        job_service::enqueue(mapping.connection_id, SyncJobType::InventorySync, &payload).await?;
    }
    Ok(())
}
