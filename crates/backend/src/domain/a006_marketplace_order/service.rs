use super::repository;
use chrono::Utc;
use contracts::domain::a001_connection::aggregate::ConnectionId;
use contracts::domain::a006_marketplace_order::aggregate::{
    MarketplaceOrder, MarketplaceOrderFilter, MarketplaceOrderId, OrderStats,
};
use contracts::domain::common::Paged;

/// Сохраняет заказ по `(platform, external_order_id)`: повторная загрузка
/// обновляет данные, но сохраняет id, связь с внутренним заказом и дату создания.
pub async fn upsert(mut order: MarketplaceOrder) -> anyhow::Result<MarketplaceOrder> {
    match repository::get_by_external_id(order.platform, &order.external_order_id).await? {
        Some(existing) => {
            order.id = existing.id;
            order.internal_order_id = existing.internal_order_id;
            order.synced_at = existing.synced_at;
            order.created_at = existing.created_at;
            order.updated_at = Utc::now();
            repository::update(&order).await?;
        }
        None => {
            repository::create(&order).await?;
        }
    }
    Ok(order)
}

pub async fn get_by_id(id: MarketplaceOrderId) -> anyhow::Result<Option<MarketplaceOrder>> {
    repository::get_by_id(id).await
}

pub async fn list(filter: &MarketplaceOrderFilter) -> anyhow::Result<Paged<MarketplaceOrder>> {
    let (items, total) = repository::list(filter).await?;
    Ok(Paged::new(items, total, filter.page_request()))
}

pub async fn stats(connection_id: Option<ConnectionId>) -> anyhow::Result<OrderStats> {
    repository::stats(connection_id).await
}
