use contracts::domain::a002_sync_job::aggregate::{OrderSyncAction, OrderSyncPayload, SyncJob};
use contracts::domain::a006_marketplace_order::aggregate::UpdateOrderStatusDto;

use super::service;
use crate::domain::a006_marketplace_order::repository;
use crate::system::jobs::logger::JobLogger;
use crate::usecases::u101_connect_marketplace::load_active;

/// Выполнение задания `order_sync`
pub async fn run_order_job(job: &SyncJob, logger: &JobLogger) -> anyhow::Result<()> {
    let payload: OrderSyncPayload = job.payload_as().map_err(anyhow::Error::msg)?;
    let connection = load_active(job.connection_id).await?;

    match payload.action {
        OrderSyncAction::Import => {
            logger.log(job.id, &format!("Importing order {}", payload.external_order_id));
            let order = service::import_external(&connection, &payload.external_order_id).await?;
            logger.log(
                job.id,
                &format!(
                    "Order {} stored as {} ({})",
                    payload.external_order_id, order.id, order.status
                ),
            );
        }
        OrderSyncAction::UpdateStatus => {
            let status = payload
                .status
                .clone()
                .ok_or_else(|| anyhow::anyhow!("update_status requires a status"))?;
            let order = repository::get_by_external_id(connection.platform, &payload.external_order_id)
                .await?
                .ok_or_else(|| anyhow::anyhow!("Order {} not found", payload.external_order_id))?;
            logger.log(
                job.id,
                &format!("Updating order {} to {}", payload.external_order_id, status),
            );
            let dto = UpdateOrderStatusDto {
                status,
                tracking_number: payload.tracking_number.clone(),
                courier: None,
            };
            service::update_status(order.id, &dto).await?;
            logger.log(job.id, "Status updated");
        }
    }
    Ok(())
}
