use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::a001_connection::aggregate::ConnectionId;

crate::uuid_id!(
    /// Уникальный идентификатор сопоставления категории
    CategoryMappingId
);

/// Сопоставление внутренней категории с категорией маркетплейса
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryMapping {
    pub id: CategoryMappingId,
    pub connection_id: ConnectionId,
    pub internal_category_id: Uuid,
    pub external_category_id: String,
    pub external_category_name: String,
    pub created_at: DateTime<Utc>,
}

impl CategoryMapping {
    pub fn new_for_insert(connection_id: ConnectionId, dto: &CreateCategoryMappingDto) -> Self {
        Self {
            id: CategoryMappingId::new_v4(),
            connection_id,
            internal_category_id: dto.internal_category_id,
            external_category_id: dto.external_category_id.trim().to_string(),
            external_category_name: dto.external_category_name.clone().unwrap_or_default(),
            created_at: Utc::now(),
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.internal_category_id.is_nil() {
            return Err("internal_category_id is required".into());
        }
        if self.external_category_id.is_empty() {
            return Err("external_category_id is required".into());
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateCategoryMappingDto {
    pub internal_category_id: Uuid,
    pub external_category_id: String,
    #[serde(default)]
    pub external_category_name: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_requires_ids() {
        let dto = CreateCategoryMappingDto {
            internal_category_id: Uuid::nil(),
            external_category_id: "100".into(),
            external_category_name: None,
        };
        let m = CategoryMapping::new_for_insert(ConnectionId::new_v4(), &dto);
        assert!(m.validate().is_err());

        let dto = CreateCategoryMappingDto {
            internal_category_id: Uuid::new_v4(),
            external_category_id: "  ".into(),
            external_category_name: Some("Phones".into()),
        };
        let m = CategoryMapping::new_for_insert(ConnectionId::new_v4(), &dto);
        assert_eq!(m.validate(), Err("external_category_id is required".to_string()));
    }
}
