use axum::{extract::Path, http::StatusCode, Json};
use contracts::domain::a001_connection::aggregate::ConnectionId;
use contracts::domain::a004_category_mapping::aggregate::{
    CategoryMapping, CategoryMappingId, CreateCategoryMappingDto,
};
use serde_json::{json, Value};

use super::{api_error, not_found, parse_uuid, ApiResult};
use crate::usecases::u105_category_sync as u105;

/// GET /connections/:id/categories/external
pub async fn external(Path(id): Path<String>) -> ApiResult<Json<Value>> {
    let connection_id = ConnectionId::new(parse_uuid(&id)?);
    let categories = u105::external_categories(connection_id)
        .await
        .map_err(api_error)?;
    Ok(Json(json!({ "categories": categories })))
}

/// GET /connections/:id/categories
pub async fn list(Path(id): Path<String>) -> ApiResult<Json<Vec<CategoryMapping>>> {
    let connection_id = ConnectionId::new(parse_uuid(&id)?);
    u105::list_mappings(connection_id)
        .await
        .map(Json)
        .map_err(api_error)
}

/// POST /connections/:id/categories
pub async fn create(
    Path(id): Path<String>,
    Json(dto): Json<CreateCategoryMappingDto>,
) -> ApiResult<(StatusCode, Json<CategoryMapping>)> {
    let connection_id = ConnectionId::new(parse_uuid(&id)?);
    let mapping = u105::create_mapping(connection_id, &dto)
        .await
        .map_err(api_error)?;
    Ok((StatusCode::CREATED, Json(mapping)))
}

/// DELETE /connections/:id/categories/:mapping_id
pub async fn delete(Path((id, mapping_id)): Path<(String, String)>) -> ApiResult<Json<Value>> {
    let connection_id = ConnectionId::new(parse_uuid(&id)?);
    let mapping_id = CategoryMappingId::new(parse_uuid(&mapping_id)?);
    if !u105::delete_mapping(connection_id, mapping_id)
        .await
        .map_err(api_error)?
    {
        return Err(not_found("Category mapping"));
    }
    Ok(Json(json!({ "message": "Mapping deleted" })))
}
