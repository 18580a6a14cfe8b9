use axum::{http::StatusCode, Json};
use contracts::events::StockChangedEvent;
use serde_json::{json, Value};

use crate::shared::events::event_bus;

/// POST /api/v1/events/stock-changed
///
/// Публикует изменение остатка во внутреннюю шину событий.
pub async fn stock_changed(Json(event): Json<StockChangedEvent>) -> (StatusCode, Json<Value>) {
    tracing::debug!(
        "Stock changed for product {}: {} -> {}",
        event.product_id,
        event.old_quantity,
        event.new_quantity
    );
    event_bus().publish_stock_changed(event);
    (StatusCode::ACCEPTED, Json(json!({ "status": "published" })))
}
