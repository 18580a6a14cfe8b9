use super::repository;
use contracts::domain::a001_connection::aggregate::ConnectionId;
use contracts::domain::a004_category_mapping::aggregate::{
    CategoryMapping, CategoryMappingId, CreateCategoryMappingDto,
};
use uuid::Uuid;

/// Ошибки создания сопоставления категорий
#[derive(Debug, thiserror::Error)]
pub enum CategoryMappingError {
    #[error("Validation failed: {0}")]
    Invalid(String),
    #[error("Category {0} is already mapped for this connection")]
    Conflict(Uuid),
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

pub async fn create(
    connection_id: ConnectionId,
    dto: &CreateCategoryMappingDto,
) -> Result<CategoryMapping, CategoryMappingError> {
    let mapping = CategoryMapping::new_for_insert(connection_id, dto);
    mapping.validate().map_err(CategoryMappingError::Invalid)?;

    if repository::get_by_internal_category(connection_id, mapping.internal_category_id)
        .await?
        .is_some()
    {
        return Err(CategoryMappingError::Conflict(mapping.internal_category_id));
    }

    repository::create(&mapping).await?;
    Ok(mapping)
}

pub async fn list(connection_id: ConnectionId) -> anyhow::Result<Vec<CategoryMapping>> {
    repository::list_by_connection(connection_id).await
}

pub async fn get_by_id(id: CategoryMappingId) -> anyhow::Result<Option<CategoryMapping>> {
    repository::get_by_id(id).await
}

/// Внешняя категория для товара: явно заданное сопоставление, иначе по
/// внутренней категории.
pub async fn resolve_external(
    connection_id: ConnectionId,
    mapping_id: Option<Uuid>,
    internal_category_id: Option<Uuid>,
) -> anyhow::Result<Option<String>> {
    if let Some(id) = mapping_id {
        if let Some(m) = repository::get_by_id(CategoryMappingId(id)).await? {
            if m.connection_id == connection_id {
                return Ok(Some(m.external_category_id));
            }
        }
    }
    match internal_category_id {
        Some(category) => Ok(repository::get_by_internal_category(connection_id, category)
            .await?
            .map(|m| m.external_category_id)),
        None => Ok(None),
    }
}

pub async fn delete(id: CategoryMappingId) -> anyhow::Result<bool> {
    repository::delete(id).await
}
