use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::domain::a001_connection::aggregate::ConnectionId;
use crate::domain::common::PageRequest;

crate::uuid_id!(
    /// Уникальный идентификатор сопоставления товара
    ProductMappingId
);

crate::uuid_id!(VariantMappingId);

/// Состояние синхронизации сопоставленного товара
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MappingSyncStatus {
    #[default]
    Synced,
    Pending,
    Error,
}

impl MappingSyncStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Synced => "synced",
            Self::Pending => "pending",
            Self::Error => "error",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "synced" => Some(Self::Synced),
            "pending" => Some(Self::Pending),
            "error" => Some(Self::Error),
            _ => None,
        }
    }
}

impl fmt::Display for MappingSyncStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Сопоставление внутреннего товара с товаром маркетплейса
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductMapping {
    pub id: ProductMappingId,
    pub connection_id: ConnectionId,
    pub internal_product_id: Uuid,
    pub external_product_id: String,
    pub external_sku: String,
    pub sync_status: MappingSyncStatus,
    pub last_synced_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sync_error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub variant_mappings: Vec<VariantMapping>,
}

impl ProductMapping {
    pub fn new_for_insert(
        connection_id: ConnectionId,
        internal_product_id: Uuid,
        external_product_id: String,
        external_sku: String,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: ProductMappingId::new_v4(),
            connection_id,
            internal_product_id,
            external_product_id,
            external_sku,
            sync_status: MappingSyncStatus::Synced,
            last_synced_at: Some(now),
            sync_error: None,
            created_at: now,
            updated_at: now,
            variant_mappings: Vec::new(),
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.external_product_id.trim().is_empty() {
            return Err("external_product_id must not be empty".into());
        }
        Ok(())
    }

    /// Applies a status transition: `synced` stamps `last_synced_at` and clears the error.
    pub fn apply_sync_status(&mut self, status: MappingSyncStatus, error: Option<String>) {
        let now = Utc::now();
        self.sync_status = status;
        self.updated_at = now;
        match status {
            MappingSyncStatus::Synced => {
                self.last_synced_at = Some(now);
                self.sync_error = None;
            }
            MappingSyncStatus::Error => self.sync_error = error,
            MappingSyncStatus::Pending => {}
        }
    }
}

/// Сопоставление варианта (модели/SKU) товара
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VariantMapping {
    pub id: VariantMappingId,
    pub product_mapping_id: ProductMappingId,
    pub internal_variant_id: Uuid,
    pub external_variant_id: String,
    pub external_sku: String,
    pub created_at: DateTime<Utc>,
}

impl VariantMapping {
    pub fn new_for_insert(
        product_mapping_id: ProductMappingId,
        internal_variant_id: Uuid,
        external_variant_id: String,
        external_sku: String,
    ) -> Self {
        Self {
            id: VariantMappingId::new_v4(),
            product_mapping_id,
            internal_variant_id,
            external_variant_id,
            external_sku,
            created_at: Utc::now(),
        }
    }
}

/// Фильтр списка сопоставлений
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProductMappingFilter {
    pub sync_status: Option<MappingSyncStatus>,
    pub internal_product_id: Option<Uuid>,
    pub page: Option<u64>,
    pub page_size: Option<u64>,
}

impl ProductMappingFilter {
    pub fn page_request(&self) -> PageRequest {
        PageRequest::new(self.page, self.page_size)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateMappingStatusDto {
    pub status: String,
}
