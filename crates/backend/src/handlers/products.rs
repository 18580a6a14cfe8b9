use axum::{
    extract::{Path, Query},
    http::StatusCode,
    Json,
};
use contracts::domain::a001_connection::aggregate::ConnectionId;
use contracts::domain::a002_sync_job::aggregate::SyncJob;
use contracts::domain::a003_product_mapping::aggregate::{
    ProductMappingFilter, ProductMappingId, UpdateMappingStatusDto,
};
use contracts::domain::a005_imported_product::aggregate::ImportedProductFilter;
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use super::{api_error, not_found, parse_uuid, ApiResult};
use crate::usecases::u102_product_sync as u102;

#[derive(Debug, Deserialize)]
pub struct PushProductsRequest {
    #[serde(default)]
    pub product_ids: Vec<Uuid>,
    #[serde(default)]
    pub category_mapping_id: Option<Uuid>,
}

fn accepted(job: SyncJob, message: &str) -> (StatusCode, Json<Value>) {
    (
        StatusCode::ACCEPTED,
        Json(json!({
            "message": message,
            "job_id": job.id,
            "status": job.status,
        })),
    )
}

/// GET /connections/:id/products
pub async fn list(
    Path(id): Path<String>,
    Query(filter): Query<ProductMappingFilter>,
) -> ApiResult<Json<Value>> {
    let connection_id = ConnectionId::new(parse_uuid(&id)?);
    let page = u102::mapped_products(connection_id, &filter).await.map_err(api_error)?;
    Ok(Json(json!({
        "products": page.items,
        "total": page.total,
        "page": page.page,
        "page_size": page.page_size,
    })))
}

/// POST /connections/:id/products/push
pub async fn push(
    Path(id): Path<String>,
    Json(req): Json<PushProductsRequest>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let connection_id = ConnectionId::new(parse_uuid(&id)?);
    let job = u102::push_products(connection_id, req.product_ids, req.category_mapping_id)
        .await
        .map_err(api_error)?;
    Ok(accepted(job, "Product push queued"))
}

/// POST /connections/:id/products/update
pub async fn update(
    Path(id): Path<String>,
    Json(req): Json<PushProductsRequest>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let connection_id = ConnectionId::new(parse_uuid(&id)?);
    let job = u102::update_products(connection_id, req.product_ids)
        .await
        .map_err(api_error)?;
    Ok(accepted(job, "Product update queued"))
}

/// PUT /connections/:id/products/:mapping_id
pub async fn update_status(
    Path((id, mapping_id)): Path<(String, String)>,
    Json(dto): Json<UpdateMappingStatusDto>,
) -> ApiResult<Json<Value>> {
    let connection_id = ConnectionId::new(parse_uuid(&id)?);
    let mapping_id = ProductMappingId::new(parse_uuid(&mapping_id)?);
    if !u102::update_mapping_status(connection_id, mapping_id, &dto.status)
        .await
        .map_err(api_error)?
    {
        return Err(not_found("Product mapping"));
    }
    Ok(Json(json!({ "message": "Mapping updated" })))
}

/// DELETE /connections/:id/products/:mapping_id
pub async fn delete(Path((id, mapping_id)): Path<(String, String)>) -> ApiResult<Json<Value>> {
    let connection_id = ConnectionId::new(parse_uuid(&id)?);
    let mapping_id = ProductMappingId::new(parse_uuid(&mapping_id)?);
    if !u102::delete_mapping(connection_id, mapping_id)
        .await
        .map_err(api_error)?
    {
        return Err(not_found("Product mapping"));
    }
    Ok(Json(json!({ "message": "Mapping deleted" })))
}

/// POST /connections/:id/products/import
pub async fn import(Path(id): Path<String>) -> ApiResult<Json<Value>> {
    let connection_id = ConnectionId::new(parse_uuid(&id)?);
    let imported = u102::import_products(connection_id).await.map_err(api_error)?;
    Ok(Json(json!({
        "message": "Products imported",
        "imported": imported,
    })))
}

/// GET /connections/:id/imported-products
pub async fn imported(
    Path(id): Path<String>,
    Query(filter): Query<ImportedProductFilter>,
) -> ApiResult<Json<Value>> {
    let connection_id = ConnectionId::new(parse_uuid(&id)?);
    let page = u102::imported_products(connection_id, &filter)
        .await
        .map_err(api_error)?;
    Ok(Json(json!({
        "products": page.items,
        "total": page.total,
        "page": page.page,
        "page_size": page.page_size,
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_push_rejects_empty_ids() {
        let req = PushProductsRequest {
            product_ids: vec![],
            category_mapping_id: None,
        };
        let (status, Json(body)) = push(Path(Uuid::new_v4().to_string()), Json(req))
            .await
            .unwrap_err();
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "product_ids must not be empty");
    }

    #[tokio::test]
    async fn test_update_status_rejects_unknown_status() {
        let dto = UpdateMappingStatusDto {
            status: "archived".into(),
        };
        let ids = (Uuid::new_v4().to_string(), Uuid::new_v4().to_string());
        let (status, _) = update_status(Path(ids), Json(dto)).await.unwrap_err();
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_push_request_defaults() {
        let req: PushProductsRequest = serde_json::from_str("{}").unwrap();
        assert!(req.product_ids.is_empty());
        assert!(req.category_mapping_id.is_none());
    }
}
