use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::a001_connection::aggregate::ConnectionId;
use crate::domain::common::PageRequest;
use crate::enums::Platform;

crate::uuid_id!(
    /// Уникальный идентификатор заказа маркетплейса
    MarketplaceOrderId
);

pub const DEFAULT_CURRENCY: &str = "MYR";

/// Локальные статусы заказа
pub mod order_status {
    pub const PENDING: &str = "pending";
    pub const CONFIRMED: &str = "confirmed";
    pub const SHIPPED: &str = "shipped";
    pub const DELIVERED: &str = "delivered";
    pub const CANCELLED: &str = "cancelled";
    pub const REFUNDED: &str = "refunded";
    pub const RETURNED: &str = "returned";

    pub const ALL: [&str; 7] = [
        PENDING, CONFIRMED, SHIPPED, DELIVERED, CANCELLED, REFUNDED, RETURNED,
    ];

    pub fn is_valid(status: &str) -> bool {
        ALL.contains(&status)
    }

    /// Normalises a marketplace order state to the local status set.
    pub fn normalize(raw: &str) -> &'static str {
        match raw.to_lowercase().as_str() {
            "unpaid" | "pending_payment" | "pending" => PENDING,
            "ready_to_ship" | "processed" | "pending_shipment" | "confirmed" => CONFIRMED,
            "shipped" | "to_confirm_receive" | "retry_ship" => SHIPPED,
            "completed" | "delivered" => DELIVERED,
            "in_cancel" | "cancelled" => CANCELLED,
            "to_return" | "returned" => RETURNED,
            "refunded" => REFUNDED,
            _ => PENDING,
        }
    }
}

/// Заказ, полученный с маркетплейса
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketplaceOrder {
    pub id: MarketplaceOrderId,
    pub connection_id: ConnectionId,
    /// Order id in the internal order service once imported
    pub internal_order_id: Option<Uuid>,
    pub external_order_id: String,
    pub platform: Platform,
    pub status: String,
    pub order_data: serde_json::Value,
    pub shipping_info: serde_json::Value,
    pub buyer_info: serde_json::Value,
    pub total_amount: f64,
    pub currency: String,
    pub synced_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl MarketplaceOrder {
    pub fn new_for_insert(
        connection_id: ConnectionId,
        platform: Platform,
        external_order_id: String,
        status: String,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: MarketplaceOrderId::new_v4(),
            connection_id,
            internal_order_id: None,
            external_order_id,
            platform,
            status,
            order_data: serde_json::json!({}),
            shipping_info: serde_json::json!({}),
            buyer_info: serde_json::json!({}),
            total_amount: 0.0,
            currency: DEFAULT_CURRENCY.to_string(),
            synced_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_imported(&self) -> bool {
        self.internal_order_id.is_some()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct OrderItemData {
    pub external_product_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub internal_product_id: Option<Uuid>,
    pub sku: String,
    pub name: String,
    pub quantity: i32,
    pub unit_price: f64,
    pub total_price: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variant_name: Option<String>,
}

/// Содержимое поля `order_data`
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct OrderData {
    pub items: Vec<OrderItemData>,
    pub subtotal_amount: f64,
    pub shipping_fee: f64,
    pub discount_amount: f64,
    pub payment_method: String,
    pub notes: String,
    /// Raw marketplace status before normalisation
    pub marketplace_status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paid_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct BuyerInfo {
    pub name: String,
    pub phone: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ShippingInfo {
    pub recipient_name: String,
    pub phone: String,
    pub address_line1: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address_line2: Option<String>,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub country: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub courier: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tracking_number: Option<String>,
}

/// Фильтр списка заказов
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MarketplaceOrderFilter {
    pub connection_id: Option<ConnectionId>,
    pub platform: Option<Platform>,
    pub status: Option<String>,
    /// Substring of the external order id
    pub search: Option<String>,
    pub imported_only: Option<bool>,
    pub date_from: Option<DateTime<Utc>>,
    pub date_to: Option<DateTime<Utc>>,
    pub page: Option<u64>,
    pub page_size: Option<u64>,
}

impl MarketplaceOrderFilter {
    pub fn page_request(&self) -> PageRequest {
        PageRequest::new(self.page, self.page_size)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct OrderStats {
    pub total_orders: u64,
    pub imported_orders: u64,
    pub pending_orders: u64,
    pub total_revenue: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateOrderStatusDto {
    pub status: String,
    #[serde(default)]
    pub tracking_number: Option<String>,
    #[serde(default)]
    pub courier: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_statuses() {
        assert_eq!(order_status::normalize("READY_TO_SHIP"), order_status::CONFIRMED);
        assert_eq!(order_status::normalize("pending_shipment"), order_status::CONFIRMED);
        assert_eq!(order_status::normalize("COMPLETED"), order_status::DELIVERED);
        assert_eq!(order_status::normalize("IN_CANCEL"), order_status::CANCELLED);
        assert_eq!(order_status::normalize("unknown_150"), order_status::PENDING);
        assert!(order_status::is_valid("refunded"));
        assert!(!order_status::is_valid("lost"));
    }

    #[test]
    fn test_new_order_defaults() {
        let o = MarketplaceOrder::new_for_insert(
            ConnectionId::new_v4(),
            Platform::Shopee,
            "2401ABC".into(),
            order_status::PENDING.into(),
        );
        assert_eq!(o.currency, "MYR");
        assert!(!o.is_imported());
    }
}
