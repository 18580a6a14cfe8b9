use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::a001_connection::aggregate::ConnectionId;
use crate::domain::common::PageRequest;

crate::uuid_id!(ImportedProductId);

/// Товар, загруженный с маркетплейса (ещё не обязательно сопоставленный)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportedProduct {
    pub id: ImportedProductId,
    pub connection_id: ConnectionId,
    pub external_product_id: String,
    pub external_sku: String,
    pub name: String,
    pub description: String,
    pub price: f64,
    pub stock: i32,
    pub category_id: String,
    /// Listing status derived from the marketplace state (`active`, `paused`, ...)
    pub status: String,
    pub image_url: String,
    pub is_mapped: bool,
    pub mapped_to_product_id: Option<Uuid>,
    pub imported_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ImportedProduct {
    pub fn new_for_insert(connection_id: ConnectionId, external_product_id: String, name: String) -> Self {
        let now = Utc::now();
        Self {
            id: ImportedProductId::new_v4(),
            connection_id,
            external_product_id,
            external_sku: String::new(),
            name,
            description: String::new(),
            price: 0.0,
            stock: 0,
            category_id: String::new(),
            status: String::new(),
            image_url: String::new(),
            is_mapped: false,
            mapped_to_product_id: None,
            imported_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImportedProductFilter {
    pub is_mapped: Option<bool>,
    pub status: Option<String>,
    pub search: Option<String>,
    pub page: Option<u64>,
    pub page_size: Option<u64>,
}

impl ImportedProductFilter {
    pub fn page_request(&self) -> PageRequest {
        PageRequest::new(self.page, self.page_size)
    }
}
