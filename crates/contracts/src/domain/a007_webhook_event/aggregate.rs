use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::common::PageRequest;
use crate::enums::Platform;

crate::uuid_id!(WebhookEventId);

/// Типы входящих событий
pub mod event_type {
    pub const SHOPEE_ORDER_CREATED: &str = "shopee.order.created";
    pub const SHOPEE_ORDER_STATUS_CHANGED: &str = "shopee.order.status_changed";
    pub const SHOPEE_ORDER_SHIPPED: &str = "shopee.order.shipped";
    pub const SHOPEE_ORDER_COMPLETED: &str = "shopee.order.completed";
    pub const SHOPEE_ORDER_CANCELLED: &str = "shopee.order.cancelled";
    pub const SHOPEE_PRODUCT_BANNED: &str = "shopee.product.banned";
    pub const SHOPEE_PRODUCT_UNBANNED: &str = "shopee.product.unbanned";
    pub const SHOPEE_INVENTORY_CHANGED: &str = "shopee.inventory.changed";
    pub const SHOPEE_AUTHORIZATION_REVOKED: &str = "shopee.authorization.revoked";

    pub const TIKTOK_ORDER_CREATED: &str = "tiktok.order.created";
    pub const TIKTOK_ORDER_STATUS_CHANGED: &str = "tiktok.order.status_changed";
    pub const TIKTOK_ORDER_SHIPPED: &str = "tiktok.order.shipped";
    pub const TIKTOK_ORDER_COMPLETED: &str = "tiktok.order.completed";
    pub const TIKTOK_ORDER_CANCELLED: &str = "tiktok.order.cancelled";
    pub const TIKTOK_PRODUCT_CREATED: &str = "tiktok.product.created";
    pub const TIKTOK_PRODUCT_UPDATED: &str = "tiktok.product.updated";
    pub const TIKTOK_PRODUCT_DELETED: &str = "tiktok.product.deleted";
    pub const TIKTOK_INVENTORY_UPDATED: &str = "tiktok.inventory.updated";

    /// Shopee push codes: 3 order status, 4 tracking number, 7 banned item,
    /// 8 reserved stock change, 12 authorization expiry.
    pub fn from_shopee_code(code: i64, order_status: Option<&str>) -> &'static str {
        match code {
            3 => match order_status.map(|s| s.to_uppercase()).as_deref() {
                Some("UNPAID") | Some("READY_TO_SHIP") => SHOPEE_ORDER_CREATED,
                Some("SHIPPED") => SHOPEE_ORDER_SHIPPED,
                Some("COMPLETED") => SHOPEE_ORDER_COMPLETED,
                Some("CANCELLED") | Some("IN_CANCEL") => SHOPEE_ORDER_CANCELLED,
                _ => SHOPEE_ORDER_STATUS_CHANGED,
            },
            4 => SHOPEE_ORDER_SHIPPED,
            7 => SHOPEE_PRODUCT_BANNED,
            8 => SHOPEE_INVENTORY_CHANGED,
            12 => SHOPEE_AUTHORIZATION_REVOKED,
            _ => SHOPEE_ORDER_STATUS_CHANGED,
        }
    }

    /// TikTok webhook `type` values. The status is either a TikTok name or
    /// the normalized text of a numeric code.
    pub fn from_tiktok_type(kind: &str, order_status: Option<&str>) -> &'static str {
        match kind {
            "ORDER_STATUS_CHANGE" | "1" => match order_status {
                Some("UNPAID") | Some("AWAITING_SHIPMENT") | Some("pending_payment")
                | Some("pending_shipment") => TIKTOK_ORDER_CREATED,
                Some("IN_TRANSIT") | Some("AWAITING_COLLECTION") | Some("shipped") => {
                    TIKTOK_ORDER_SHIPPED
                }
                Some("COMPLETED") | Some("DELIVERED") | Some("completed") => TIKTOK_ORDER_COMPLETED,
                Some("CANCELLED") | Some("cancelled") => TIKTOK_ORDER_CANCELLED,
                _ => TIKTOK_ORDER_STATUS_CHANGED,
            },
            "PRODUCT_CREATION" => TIKTOK_PRODUCT_CREATED,
            "PRODUCT_STATUS_CHANGE" | "PRODUCT_INFORMATION_CHANGE" => TIKTOK_PRODUCT_UPDATED,
            "PRODUCT_DELETION" => TIKTOK_PRODUCT_DELETED,
            "INVENTORY_CHANGE" => TIKTOK_INVENTORY_UPDATED,
            _ => TIKTOK_ORDER_STATUS_CHANGED,
        }
    }
}

/// Входящее webhook-событие маркетплейса
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookEvent {
    pub id: WebhookEventId,
    pub platform: Platform,
    pub event_type: String,
    pub payload: serde_json::Value,
    pub signature: String,
    /// sha256 of the raw body, used to drop duplicate deliveries
    pub payload_hash: String,
    pub processed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    pub received_at: DateTime<Utc>,
}

impl WebhookEvent {
    pub fn new_for_insert(
        platform: Platform,
        event_type: &str,
        payload: serde_json::Value,
        signature: String,
        payload_hash: String,
    ) -> Self {
        Self {
            id: WebhookEventId::new_v4(),
            platform,
            event_type: event_type.to_string(),
            payload,
            signature,
            payload_hash,
            processed: false,
            error_message: None,
            received_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WebhookEventFilter {
    pub platform: Option<Platform>,
    pub event_type: Option<String>,
    pub processed: Option<bool>,
    pub page: Option<u64>,
    pub page_size: Option<u64>,
}

impl WebhookEventFilter {
    pub fn page_request(&self) -> PageRequest {
        PageRequest::new(self.page, self.page_size)
    }
}

#[cfg(test)]
mod tests {
    use super::event_type::*;

    #[test]
    fn test_shopee_codes() {
        assert_eq!(from_shopee_code(3, Some("READY_TO_SHIP")), SHOPEE_ORDER_CREATED);
        assert_eq!(from_shopee_code(3, Some("cancelled")), SHOPEE_ORDER_CANCELLED);
        assert_eq!(from_shopee_code(3, None), SHOPEE_ORDER_STATUS_CHANGED);
        assert_eq!(from_shopee_code(12, None), SHOPEE_AUTHORIZATION_REVOKED);
    }

    #[test]
    fn test_tiktok_types() {
        assert_eq!(
            from_tiktok_type("ORDER_STATUS_CHANGE", Some("CANCELLED")),
            TIKTOK_ORDER_CANCELLED
        );
        assert_eq!(from_tiktok_type("PRODUCT_DELETION", None), TIKTOK_PRODUCT_DELETED);
        assert_eq!(from_tiktok_type("INVENTORY_CHANGE", None), TIKTOK_INVENTORY_UPDATED);
    }

    #[test]
    fn test_tiktok_normalized_statuses() {
        assert_eq!(from_tiktok_type("1", Some("pending_shipment")), TIKTOK_ORDER_CREATED);
        assert_eq!(from_tiktok_type("1", Some("shipped")), TIKTOK_ORDER_SHIPPED);
        assert_eq!(from_tiktok_type("1", Some("completed")), TIKTOK_ORDER_COMPLETED);
        assert_eq!(from_tiktok_type("1", Some("unknown_7")), TIKTOK_ORDER_STATUS_CHANGED);
    }
}
