use axum::{
    extract::{Path, Query},
    Json,
};
use chrono::{DateTime, Utc};
use contracts::domain::a001_connection::aggregate::ConnectionId;
use contracts::domain::a006_marketplace_order::aggregate::{
    MarketplaceOrder, MarketplaceOrderFilter, MarketplaceOrderId, OrderStats, UpdateOrderStatusDto,
};
use serde::Deserialize;
use serde_json::{json, Value};

use super::{api_error, parse_uuid, ApiResult};
use crate::usecases::u104_order_sync as u104;

#[derive(Debug, Default, Deserialize)]
pub struct StatsQuery {
    pub connection_id: Option<ConnectionId>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SyncOrdersRequest {
    #[serde(default)]
    pub since: Option<DateTime<Utc>>,
}

/// GET /orders
pub async fn list(Query(filter): Query<MarketplaceOrderFilter>) -> ApiResult<Json<Value>> {
    let page = u104::list_orders(&filter).await.map_err(api_error)?;
    Ok(Json(json!({
        "orders": page.items,
        "total": page.total,
        "page": page.page,
        "page_size": page.page_size,
    })))
}

/// GET /orders/stats
pub async fn stats(Query(query): Query<StatsQuery>) -> ApiResult<Json<OrderStats>> {
    u104::stats(query.connection_id)
        .await
        .map(Json)
        .map_err(api_error)
}

/// POST /connections/:id/orders/sync
///
/// Тело необязательно: `{"since": "..."}`, по умолчанию последние 15 дней.
pub async fn sync(Path(id): Path<String>, body: Option<Json<SyncOrdersRequest>>) -> ApiResult<Json<Value>> {
    let connection_id = ConnectionId::new(parse_uuid(&id)?);
    let since = body.and_then(|Json(req)| req.since);
    let synced = u104::sync_orders(connection_id, since)
        .await
        .map_err(api_error)?;
    Ok(Json(json!({
        "message": "Orders synced",
        "synced": synced,
    })))
}

/// POST /orders/:id/import
pub async fn import(Path(id): Path<String>) -> ApiResult<Json<Value>> {
    let order_id = MarketplaceOrderId::new(parse_uuid(&id)?);
    let internal_id = u104::import_to_internal(order_id)
        .await
        .map_err(api_error)?;
    Ok(Json(json!({
        "message": "Order imported",
        "internal_order_id": internal_id,
    })))
}

/// PUT /orders/:id/status
pub async fn update_status(
    Path(id): Path<String>,
    Json(dto): Json<UpdateOrderStatusDto>,
) -> ApiResult<Json<MarketplaceOrder>> {
    let order_id = MarketplaceOrderId::new(parse_uuid(&id)?);
    u104::update_status(order_id, &dto)
        .await
        .map(Json)
        .map_err(api_error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[tokio::test]
    async fn test_update_status_rejects_unknown_status() {
        let dto = UpdateOrderStatusDto {
            status: "teleported".into(),
            tracking_number: None,
            courier: None,
        };
        let (status, _) = update_status(Path(uuid::Uuid::new_v4().to_string()), Json(dto))
            .await
            .unwrap_err();
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_sync_request_since_is_optional() {
        let req: SyncOrdersRequest = serde_json::from_str("{}").unwrap();
        assert!(req.since.is_none());
        let req: SyncOrdersRequest = serde_json::from_str(r#"{"since":"2024-05-01T00:00:00Z"}"#).unwrap();
        assert!(req.since.is_some());
    }
}
