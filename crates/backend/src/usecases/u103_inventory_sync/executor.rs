use contracts::domain::a002_sync_job::aggregate::{InventorySyncPayload, SyncJob};
use contracts::domain::a003_product_mapping::aggregate::MappingSyncStatus;
use contracts::events::SyncKind;

use crate::domain::a003_product_mapping::repository as mapping_repository;
use crate::shared::events::event_bus;
use crate::shared::marketplaces::types::InventoryUpdate;
use crate::system::jobs::logger::JobLogger;
use crate::usecases::u101_connect_marketplace::{access_for, load_active};

/// Выполнение задания `inventory_sync`
pub async fn run_inventory_job(job: &SyncJob, logger: &JobLogger) -> anyhow::Result<()> {
    let payload: InventorySyncPayload = job.payload_as().map_err(anyhow::Error::msg)?;
    let connection = load_active(job.connection_id).await?;
    let mapping =
        mapping_repository::get_by_connection_and_internal_id(connection.id, payload.internal_product_id)
            .await?
            .ok_or_else(|| {
                anyhow::anyhow!(
                    "Product {} is not mapped on connection {}",
                    payload.internal_product_id,
                    connection.id
                )
            })?;
    let (provider, token) = access_for(&connection)?;

    logger.log(
        job.id,
        &format!(
            "Setting stock of {} ({}) to {}",
            mapping.external_product_id, payload.internal_product_id, payload.new_quantity
        ),
    );

    let update = InventoryUpdate {
        external_product_id: mapping.external_product_id.clone(),
        external_sku: mapping.external_sku.clone(),
        quantity: payload.new_quantity,
    };
    let outcome = provider
        .update_inventory(&token, &connection.shop_id, std::slice::from_ref(&update))
        .await
        .map_err(anyhow::Error::from)
        .and_then(|results| match results.into_iter().next() {
            Some(r) if r.success => Ok(()),
            Some(r) => Err(anyhow::anyhow!(r.error.unwrap_or_else(|| "stock update rejected".into()))),
            None => Err(anyhow::anyhow!("Marketplace returned no result")),
        });

    match outcome {
        Ok(()) => {
            mapping_repository::update_sync_status(mapping.id, MappingSyncStatus::Synced, None).await?;
            logger.log(job.id, "Stock updated");
            event_bus().publish_sync_completed(&connection, Some(payload.internal_product_id), SyncKind::Inventory);
            Ok(())
        }
        Err(e) => {
            mapping_repository::update_sync_status(mapping.id, MappingSyncStatus::Error, Some(e.to_string()))
                .await?;
            logger.log(job.id, &format!("Stock update failed: {}", e));
            event_bus().publish_sync_failed(
                &connection,
                Some(payload.internal_product_id),
                SyncKind::Inventory,
                &e,
            );
            Err(e)
        }
    }
}
