//! Platform-neutral request/response types shared by all providers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at: DateTime<Utc>,
    pub shop_id: String,
    pub shop_name: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ShopInfo {
    pub shop_id: String,
    pub shop_name: String,
    pub status: String,
    pub region: String,
    pub currency: String,
    pub shop_logo: String,
    pub description: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Dimensions {
    pub length: f64,
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VariantRequest {
    pub sku: String,
    pub name: String,
    pub price: f64,
    pub stock: i32,
    pub image_url: String,
}

/// Товар для публикации на маркетплейсе
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProductPushRequest {
    pub internal_id: String,
    pub name: String,
    pub description: String,
    pub price: f64,
    pub original_price: f64,
    pub stock: i32,
    pub sku: String,
    /// External (marketplace) category id
    pub category_id: String,
    /// Image ids already uploaded to the marketplace, or URLs
    pub images: Vec<String>,
    /// Grams
    pub weight: f64,
    pub dimensions: Option<Dimensions>,
    pub variants: Vec<VariantRequest>,
    pub attributes: serde_json::Map<String, serde_json::Value>,
    pub brand: String,
    pub condition: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VariantMappingResult {
    pub internal_sku: String,
    pub external_sku: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProductPushResponse {
    pub external_product_id: String,
    pub external_sku: String,
    pub status: String,
    pub variant_mappings: Vec<VariantMappingResult>,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProductUpdateRequest {
    pub name: String,
    pub description: String,
    pub price: Option<f64>,
    pub original_price: Option<f64>,
    pub stock: Option<i32>,
    pub images: Vec<String>,
    pub attributes: serde_json::Map<String, serde_json::Value>,
}

/// Товар из каталога маркетплейса (для импорта)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExternalProduct {
    pub external_product_id: String,
    pub external_sku: String,
    pub name: String,
    pub description: String,
    pub price: f64,
    pub stock: i32,
    pub category_id: String,
    pub status: String,
    pub image_url: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProductPage {
    pub items: Vec<ExternalProduct>,
    pub has_more: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExternalCategory {
    pub category_id: String,
    pub category_name: String,
    pub parent_id: String,
    pub is_leaf: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<ExternalCategory>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryUpdate {
    pub external_product_id: String,
    #[serde(default)]
    pub external_sku: String,
    pub quantity: i32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InventoryItem {
    pub external_product_id: String,
    pub external_sku: String,
    pub quantity: i32,
    pub reserved: i32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InventoryUpdateResult {
    pub external_product_id: String,
    pub external_sku: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl InventoryUpdateResult {
    pub fn ok(update: &InventoryUpdate) -> Self {
        Self {
            external_product_id: update.external_product_id.clone(),
            external_sku: update.external_sku.clone(),
            success: true,
            error: None,
        }
    }

    pub fn failed(update: &InventoryUpdate, error: impl ToString) -> Self {
        Self {
            external_product_id: update.external_product_id.clone(),
            external_sku: update.external_sku.clone(),
            success: false,
            error: Some(error.to_string()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderListParams {
    pub time_from: DateTime<Utc>,
    pub time_to: DateTime<Utc>,
    /// Marketplace-side status filter
    pub status: Option<String>,
    pub page_size: u32,
    pub cursor: Option<String>,
}

impl OrderListParams {
    pub fn since(time_from: DateTime<Utc>) -> Self {
        Self {
            time_from,
            time_to: Utc::now(),
            status: None,
            page_size: 50,
            cursor: None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ShippingAddress {
    pub name: String,
    pub phone: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub country: String,
    pub zip_code: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExternalOrderItem {
    pub external_product_id: String,
    pub external_sku: String,
    pub name: String,
    pub quantity: i32,
    pub unit_price: f64,
    pub total_price: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExternalOrder {
    pub external_order_id: String,
    /// Raw marketplace status
    pub status: String,
    pub items: Vec<ExternalOrderItem>,
    pub buyer_name: String,
    pub buyer_id: String,
    pub shipping_address: ShippingAddress,
    pub total_amount: f64,
    pub currency: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub paid_at: Option<DateTime<Utc>>,
    pub tracking_number: String,
    pub carrier: String,
}

/// Страница заказов и курсор следующей страницы
#[derive(Debug, Clone, Default)]
pub struct OrderPage {
    pub orders: Vec<ExternalOrder>,
    pub next_cursor: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrackingInfo {
    pub courier: String,
    pub tracking_number: String,
    pub shipped_at: Option<DateTime<Utc>>,
}

/// Разобранное тело webhook-запроса
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookPayload {
    /// Local event type (`shopee.order.created`, ...)
    pub event_type: String,
    pub shop_id: String,
    pub timestamp: i64,
    pub order_id: Option<String>,
    pub order_status: Option<String>,
    pub raw: serde_json::Value,
}

/// Seconds since the epoch as UTC, with 0 mapped to now.
pub(crate) fn from_unix(ts: i64) -> DateTime<Utc> {
    if ts <= 0 {
        return Utc::now();
    }
    DateTime::from_timestamp(ts, 0).unwrap_or_else(Utc::now)
}

/// Nests a flat category list by `parent_id`. Categories whose parent is
/// missing from the list become roots.
pub fn build_category_tree(flat: Vec<ExternalCategory>) -> Vec<ExternalCategory> {
    use std::collections::{HashMap, HashSet};

    let ids: HashSet<String> = flat.iter().map(|c| c.category_id.clone()).collect();
    let mut by_parent: HashMap<String, Vec<ExternalCategory>> = HashMap::new();
    let mut roots = Vec::new();
    for cat in flat {
        if cat.parent_id.is_empty() || cat.parent_id == "0" || !ids.contains(&cat.parent_id) {
            roots.push(cat);
        } else {
            by_parent.entry(cat.parent_id.clone()).or_default().push(cat);
        }
    }

    fn attach(node: &mut ExternalCategory, by_parent: &mut HashMap<String, Vec<ExternalCategory>>) {
        if let Some(mut children) = by_parent.remove(&node.category_id) {
            for child in children.iter_mut() {
                attach(child, by_parent);
            }
            node.children = children;
        }
    }

    for root in roots.iter_mut() {
        attach(root, &mut by_parent);
    }
    roots
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cat(id: &str, parent: &str) -> ExternalCategory {
        ExternalCategory {
            category_id: id.into(),
            category_name: format!("cat {}", id),
            parent_id: parent.into(),
            is_leaf: false,
            children: Vec::new(),
        }
    }

    #[test]
    fn test_build_category_tree() {
        let tree = build_category_tree(vec![
            cat("1", "0"),
            cat("2", "1"),
            cat("3", "2"),
            cat("4", "0"),
            cat("5", "99"),
        ]);
        assert_eq!(tree.len(), 3);
        assert_eq!(tree[0].category_id, "1");
        assert_eq!(tree[0].children[0].category_id, "2");
        assert_eq!(tree[0].children[0].children[0].category_id, "3");
        assert!(tree[1].children.is_empty());
        // orphan becomes a root
        assert_eq!(tree[2].category_id, "5");
    }

    #[test]
    fn test_from_unix() {
        assert_eq!(from_unix(1_700_000_000).timestamp(), 1_700_000_000);
        assert!(from_unix(0) <= Utc::now());
    }

    #[test]
    fn test_inventory_result_helpers() {
        let update = InventoryUpdate {
            external_product_id: "1".into(),
            external_sku: "SKU".into(),
            quantity: 3,
        };
        assert!(InventoryUpdateResult::ok(&update).success);
        let failed = InventoryUpdateResult::failed(&update, "boom");
        assert!(!failed.success);
        assert_eq!(failed.error.as_deref(), Some("boom"));
    }
}
