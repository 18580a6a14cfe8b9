use chrono::{DateTime, Duration, Utc};
use contracts::domain::a001_connection::aggregate::{Connection, ConnectionId};
use contracts::domain::a006_marketplace_order::aggregate::{
    order_status, MarketplaceOrder, MarketplaceOrderFilter, MarketplaceOrderId, OrderStats,
    UpdateOrderStatusDto,
};
use contracts::domain::common::Paged;
use contracts::enums::Platform;
use contracts::events::SyncKind;
use uuid::Uuid;

use super::mapper;
use crate::domain::a001_connection::service as connection_service;
use crate::domain::a003_product_mapping::repository as mapping_repository;
use crate::domain::a006_marketplace_order::{repository, service as order_service};
use crate::shared::clients::order_client;
use crate::shared::events::event_bus;
use crate::shared::marketplaces::types::{ExternalOrder, OrderListParams, TrackingInfo};
use crate::usecases::{invalid, not_found};
use crate::usecases::u101_connect_marketplace::{access_for, load_active};

/// Default look-back window of a sync without `since`
pub const DEFAULT_SYNC_DAYS: i64 = 15;
const MAX_ORDER_PAGES: usize = 100;

/// Сохраняет заказ маркетплейса, проставляя внутренние id товаров по сопоставлениям
pub async fn upsert_external(connection: &Connection, ext: &ExternalOrder) -> anyhow::Result<MarketplaceOrder> {
    let mut order = mapper::to_local(connection, ext);
    let mut data = mapper::order_data(&order);
    for item in data.items.iter_mut() {
        if item.external_product_id.is_empty() {
            continue;
        }
        item.internal_product_id =
            mapping_repository::get_by_connection_and_external_id(connection.id, &item.external_product_id)
                .await?
                .map(|m| m.internal_product_id);
    }
    order.order_data = serde_json::to_value(data)?;
    order_service::upsert(order).await
}

/// Загрузка заказов за период; возвращает число сохранённых заказов
pub async fn sync_orders(connection_id: ConnectionId, since: Option<DateTime<Utc>>) -> anyhow::Result<usize> {
    let connection = load_active(connection_id).await?;
    let (provider, token) = access_for(&connection)?;

    let mut params = OrderListParams::since(since.unwrap_or_else(|| Utc::now() - Duration::days(DEFAULT_SYNC_DAYS)));
    let mut synced = 0usize;
    for _ in 0..MAX_ORDER_PAGES {
        let page = provider.orders(&token, &connection.shop_id, &params).await?;
        for ext in &page.orders {
            upsert_external(&connection, ext).await?;
            synced += 1;
        }
        match page.next_cursor {
            Some(cursor) if !cursor.is_empty() && !page.orders.is_empty() => params.cursor = Some(cursor),
            _ => break,
        }
    }

    tracing::info!(
        "Synced {} order(s) from {} shop {}",
        synced,
        connection.platform,
        connection.shop_id
    );
    event_bus().publish_sync_completed(&connection, None, SyncKind::Order);
    Ok(synced)
}

/// Создаёт заказ во внутреннем сервисе и связывает его с локальной записью.
/// Уже связанный заказ не создаётся повторно.
pub async fn import_to_internal(order_id: MarketplaceOrderId) -> anyhow::Result<Uuid> {
    let order = repository::get_by_id(order_id)
        .await?
        .ok_or_else(|| not_found(format!("Order {}", order_id)))?;
    link_order(&order).await
}

async fn link_order(order: &MarketplaceOrder) -> anyhow::Result<Uuid> {
    if let Some(internal) = order.internal_order_id {
        return Ok(internal);
    }
    let internal_id = order_client()
        .create_order(&mapper::create_request(order))
        .await?;
    repository::link_to_internal_order(order.id, internal_id).await?;
    tracing::info!(
        "Order {} {} imported as internal order {}",
        order.platform,
        order.external_order_id,
        internal_id
    );
    Ok(internal_id)
}

/// Обработка события заказа из webhook или задания `order_sync`
pub async fn handle_order_event(platform: Platform, shop_id: &str, external_order_id: &str) -> anyhow::Result<MarketplaceOrder> {
    let connection = connection_service::find_active(platform, shop_id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("No active {} connection for shop {}", platform, shop_id))?;
    import_external(&connection, external_order_id).await
}

pub(crate) async fn import_external(connection: &Connection, external_order_id: &str) -> anyhow::Result<MarketplaceOrder> {
    let (provider, token) = access_for(connection)?;
    let ext = provider
        .order(&token, &connection.shop_id, external_order_id)
        .await?;
    let mut order = upsert_external(connection, &ext).await?;

    match link_order(&order).await {
        Ok(internal_id) => order.internal_order_id = Some(internal_id),
        Err(e) => {
            event_bus().publish_sync_failed(connection, None, SyncKind::Order, &e);
            return Err(e);
        }
    }
    event_bus().publish_sync_completed(connection, None, SyncKind::Order);
    Ok(order)
}

/// Смена статуса: маркетплейс, затем сервис заказов (если заказ связан),
/// затем локальная запись.
pub async fn update_status(order_id: MarketplaceOrderId, dto: &UpdateOrderStatusDto) -> anyhow::Result<MarketplaceOrder> {
    let status = dto.status.trim().to_lowercase();
    if !order_status::is_valid(&status) {
        return Err(invalid(format!(
            "Invalid status '{}', expected one of: {}",
            dto.status,
            order_status::ALL.join(", ")
        )));
    }
    let mut order = repository::get_by_id(order_id)
        .await?
        .ok_or_else(|| not_found(format!("Order {}", order_id)))?;
    let connection = load_active(order.connection_id).await?;
    let (provider, token) = access_for(&connection)?;

    let tracking = dto.tracking_number.as_ref().map(|number| TrackingInfo {
        courier: dto.courier.clone().unwrap_or_default(),
        tracking_number: number.clone(),
        shipped_at: Some(Utc::now()),
    });
    provider
        .update_order_status(&token, &connection.shop_id, &order.external_order_id, &status, tracking.as_ref())
        .await?;

    if let Some(internal_id) = order.internal_order_id {
        order_client()
            .update_order_status(internal_id, &status, dto.tracking_number.as_deref())
            .await?;
    }

    if let Some(tracking) = &tracking {
        let mut shipping = mapper::shipping_info(&order);
        shipping.tracking_number = Some(tracking.tracking_number.clone());
        if !tracking.courier.is_empty() {
            shipping.courier = Some(tracking.courier.clone());
        }
        order.shipping_info = serde_json::to_value(shipping)?;
    }
    order.status = status;
    order.updated_at = Utc::now();
    repository::update(&order).await?;
    Ok(order)
}

pub async fn list_orders(filter: &MarketplaceOrderFilter) -> anyhow::Result<Paged<MarketplaceOrder>> {
    order_service::list(filter).await
}

pub async fn stats(connection_id: Option<ConnectionId>) -> anyhow::Result<OrderStats> {
    order_service::stats(connection_id).await
}
