//! Payloads of in-process events exchanged between sync services.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::a001_connection::aggregate::ConnectionId;
use crate::enums::Platform;

pub const SUBJECT_INVENTORY_STOCK_CHANGED: &str = "inventory.stock.changed";
pub const SUBJECT_MARKETPLACE_SYNC_COMPLETED: &str = "marketplace.sync.completed";
pub const SUBJECT_MARKETPLACE_SYNC_FAILED: &str = "marketplace.sync.failed";

/// Изменение остатка во внутренней системе
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StockChangedEvent {
    pub product_id: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variant_id: Option<Uuid>,
    #[serde(default)]
    pub sku: String,
    #[serde(default)]
    pub old_quantity: i32,
    pub new_quantity: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warehouse_id: Option<String>,
    /// sale, adjustment, return, ...
    #[serde(default)]
    pub reason: String,
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
}

/// Вид синхронизации в событиях завершения
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncKind {
    Inventory,
    Product,
    Order,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SyncCompletedEvent {
    pub connection_id: ConnectionId,
    pub platform: Platform,
    pub product_id: Option<Uuid>,
    pub sync_type: SyncKind,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SyncFailedEvent {
    pub connection_id: ConnectionId,
    pub platform: Platform,
    pub product_id: Option<Uuid>,
    pub sync_type: SyncKind,
    pub error: String,
    pub timestamp: DateTime<Utc>,
}

/// Any event carried by the bus, tagged with its subject.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "subject", content = "data")]
pub enum MarketplaceEvent {
    #[serde(rename = "inventory.stock.changed")]
    StockChanged(StockChangedEvent),
    #[serde(rename = "marketplace.sync.completed")]
    SyncCompleted(SyncCompletedEvent),
    #[serde(rename = "marketplace.sync.failed")]
    SyncFailed(SyncFailedEvent),
}

impl MarketplaceEvent {
    pub fn subject(&self) -> &'static str {
        match self {
            Self::StockChanged(_) => SUBJECT_INVENTORY_STOCK_CHANGED,
            Self::SyncCompleted(_) => SUBJECT_MARKETPLACE_SYNC_COMPLETED,
            Self::SyncFailed(_) => SUBJECT_MARKETPLACE_SYNC_FAILED,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stock_changed_defaults() {
        let json = r#"{"product_id":"6f1c1f52-8a8e-4d5e-9a55-0a3f3f1d2b11","new_quantity":4}"#;
        let event: StockChangedEvent = serde_json::from_str(json).unwrap();
        assert_eq!(event.new_quantity, 4);
        assert_eq!(event.old_quantity, 0);
        assert!(event.variant_id.is_none());
    }

    #[test]
    fn test_event_is_tagged_with_subject() {
        let event = MarketplaceEvent::SyncFailed(SyncFailedEvent {
            connection_id: ConnectionId::new_v4(),
            platform: Platform::TikTok,
            product_id: None,
            sync_type: SyncKind::Inventory,
            error: "rate limited".into(),
            timestamp: Utc::now(),
        });
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["subject"], SUBJECT_MARKETPLACE_SYNC_FAILED);
        assert_eq!(value["data"]["sync_type"], "inventory");
        assert_eq!(event.subject(), SUBJECT_MARKETPLACE_SYNC_FAILED);
    }
}
