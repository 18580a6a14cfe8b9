use axum::{extract::Path, Json};
use contracts::domain::a001_connection::aggregate::ConnectionId;
use serde::Deserialize;
use serde_json::{json, Value};

use super::{api_error, parse_uuid, ApiResult};
use crate::shared::marketplaces::types::InventoryUpdate;
use crate::usecases::u103_inventory_sync as u103;

#[derive(Debug, Deserialize)]
pub struct InventoryPushRequest {
    #[serde(default)]
    pub updates: Vec<InventoryUpdate>,
}

#[derive(Debug, Deserialize)]
pub struct InventoryStatusRequest {
    #[serde(default)]
    pub product_ids: Vec<String>,
}

/// POST /connections/:id/inventory/push
pub async fn push(
    Path(id): Path<String>,
    Json(req): Json<InventoryPushRequest>,
) -> ApiResult<Json<Value>> {
    let connection_id = ConnectionId::new(parse_uuid(&id)?);
    let results = u103::push_inventory(connection_id, &req.updates)
        .await
        .map_err(api_error)?;
    let success_count = results.iter().filter(|r| r.success).count();
    Ok(Json(json!({
        "success_count": success_count,
        "total_count": results.len(),
        "results": results,
    })))
}

/// POST /connections/:id/inventory/status
pub async fn status(
    Path(id): Path<String>,
    Json(req): Json<InventoryStatusRequest>,
) -> ApiResult<Json<Value>> {
    let connection_id = ConnectionId::new(parse_uuid(&id)?);
    let items = u103::inventory_status(connection_id, &req.product_ids)
        .await
        .map_err(api_error)?;
    Ok(Json(json!({ "inventory": items })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[tokio::test]
    async fn test_push_rejects_negative_quantity() {
        let req: InventoryPushRequest = serde_json::from_value(json!({
            "updates": [{"external_product_id": "100", "external_sku": "A", "quantity": -1}]
        }))
        .unwrap();
        let (status, _) = push(Path(uuid::Uuid::new_v4().to_string()), Json(req))
            .await
            .unwrap_err();
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
