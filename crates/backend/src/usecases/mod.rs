pub mod u101_connect_marketplace;
pub mod u102_product_sync;
pub mod u103_inventory_sync;
pub mod u104_order_sync;
pub mod u105_category_sync;
pub mod u106_process_webhook;

/// Некорректный запрос к сценарию (HTTP 400)
#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct InvalidRequest(pub String);

pub(crate) fn invalid(msg: impl Into<String>) -> anyhow::Error {
    InvalidRequest(msg.into()).into()
}

/// Запрошенная запись не найдена (HTTP 404)
#[derive(Debug, thiserror::Error)]
#[error("{0} not found")]
pub struct NotFound(pub String);

pub(crate) fn not_found(what: impl Into<String>) -> anyhow::Error {
    NotFound(what.into()).into()
}
