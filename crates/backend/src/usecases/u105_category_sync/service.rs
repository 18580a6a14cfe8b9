use contracts::domain::a001_connection::aggregate::ConnectionId;
use contracts::domain::a004_category_mapping::aggregate::{
    CategoryMapping, CategoryMappingId, CreateCategoryMappingDto,
};

use crate::domain::a004_category_mapping::service as category_service;
pub use crate::domain::a004_category_mapping::service::CategoryMappingError;
use crate::shared::marketplaces::types::ExternalCategory;
use crate::usecases::u101_connect_marketplace::{access_for, load_active};

/// Дерево категорий маркетплейса
pub async fn external_categories(connection_id: ConnectionId) -> anyhow::Result<Vec<ExternalCategory>> {
    let connection = load_active(connection_id).await?;
    let (provider, token) = access_for(&connection)?;
    Ok(provider.categories(&token, &connection.shop_id).await?)
}

pub async fn list_mappings(connection_id: ConnectionId) -> anyhow::Result<Vec<CategoryMapping>> {
    category_service::list(connection_id).await
}

pub async fn create_mapping(
    connection_id: ConnectionId,
    dto: &CreateCategoryMappingDto,
) -> anyhow::Result<CategoryMapping> {
    load_active(connection_id).await?;
    let mapping = category_service::create(connection_id, dto).await?;
    tracing::info!(
        "Category {} mapped to {} ({}) on connection {}",
        mapping.internal_category_id,
        mapping.external_category_id,
        mapping.external_category_name,
        connection_id
    );
    Ok(mapping)
}

/// False when the mapping is missing or belongs to another connection.
pub async fn delete_mapping(connection_id: ConnectionId, mapping_id: CategoryMappingId) -> anyhow::Result<bool> {
    match category_service::get_by_id(mapping_id).await? {
        Some(m) if m.connection_id == connection_id => category_service::delete(mapping_id).await,
        _ => Ok(false),
    }
}
