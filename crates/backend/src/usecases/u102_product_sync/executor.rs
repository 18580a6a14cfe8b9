use contracts::domain::a001_connection::aggregate::Connection;
use contracts::domain::a002_sync_job::aggregate::{ProductPushPayload, SyncJob, SyncJobType};
use contracts::events::SyncKind;
use uuid::Uuid;

use super::mapper;
use crate::domain::a003_product_mapping::{repository as mapping_repository, service as mapping_service};
use crate::domain::a004_category_mapping::service as category_service;
use crate::shared::clients::catalog_client;
use crate::shared::events::event_bus;
use crate::shared::marketplaces::MarketplaceProvider;
use crate::system::jobs::logger::JobLogger;
use crate::usecases::u101_connect_marketplace::{access_for, load_active};

/// Выполнение заданий `product_push` и `product_update`.
///
/// Ошибка одного товара фиксируется в его сопоставлении; задание падает,
/// только если не удалось выгрузить ни одного товара.
pub async fn run_product_job(job: &SyncJob, logger: &JobLogger) -> anyhow::Result<()> {
    let payload: ProductPushPayload = job.payload_as().map_err(anyhow::Error::msg)?;
    let connection = load_active(job.connection_id).await?;
    let (provider, token) = access_for(&connection)?;
    let update_only = job.job_type == SyncJobType::ProductUpdate;

    let total = payload.internal_product_ids.len();
    logger.log(
        job.id,
        &format!(
            "{} {} product(s) to {} shop {}",
            if update_only { "Updating" } else { "Pushing" },
            total,
            connection.platform,
            connection.shop_id
        ),
    );

    let mut failed = 0usize;
    for product_id in &payload.internal_product_ids {
        let result = sync_product(
            &connection,
            provider.as_ref(),
            &token,
            *product_id,
            payload.category_mapping_id,
            update_only,
        )
        .await;

        match result {
            Ok(external_id) => {
                logger.log(job.id, &format!("Product {} -> {}", product_id, external_id));
                event_bus().publish_sync_completed(&connection, Some(*product_id), SyncKind::Product);
            }
            Err(e) => {
                failed += 1;
                let message = e.to_string();
                logger.log(job.id, &format!("Product {} failed: {}", product_id, message));
                if let Err(store_err) =
                    mapping_service::record_error(connection.id, *product_id, &message).await
                {
                    tracing::error!("Cannot store sync error for product {}: {}", product_id, store_err);
                }
                event_bus().publish_sync_failed(&connection, Some(*product_id), SyncKind::Product, &message);
            }
        }
    }

    logger.log(
        job.id,
        &format!("Done: {} succeeded, {} failed", total - failed, failed),
    );
    if total > 0 && failed == total {
        anyhow::bail!("All {} product(s) failed to sync", total);
    }
    Ok(())
}

/// Returns the external product id.
async fn sync_product(
    connection: &Connection,
    provider: &dyn MarketplaceProvider,
    token: &str,
    product_id: Uuid,
    category_mapping_id: Option<Uuid>,
    update_only: bool,
) -> anyhow::Result<String> {
    let product = catalog_client().get_product(product_id).await?;
    let existing =
        mapping_repository::get_by_connection_and_internal_id(connection.id, product_id).await?;

    match existing {
        Some(mapping) => {
            provider
                .update_product(
                    token,
                    &connection.shop_id,
                    &mapping.external_product_id,
                    &mapper::update_request(&product),
                )
                .await?;
            mapping_service::record_synced(connection.id, product_id, &mapping.external_product_id, "", &[])
                .await?;
            Ok(mapping.external_product_id)
        }
        None if update_only => anyhow::bail!("Product is not mapped on this connection"),
        None => {
            let category = category_service::resolve_external(
                connection.id,
                category_mapping_id,
                product.category_id,
            )
            .await?
            .ok_or_else(|| anyhow::anyhow!("No category mapping for product category"))?;

            let response = provider
                .push_product(token, &connection.shop_id, &mapper::push_request(&product, &category))
                .await?;
            for warning in &response.warnings {
                tracing::warn!("Product {} pushed with warning: {}", product_id, warning);
            }
            let variants = mapper::match_variants(&product, &response);
            mapping_service::record_synced(
                connection.id,
                product_id,
                &response.external_product_id,
                &response.external_sku,
                &variants,
            )
            .await?;
            Ok(response.external_product_id)
        }
    }
}
