use contracts::domain::a007_webhook_event::aggregate::event_type;
use serde::Deserialize;
use serde_json::Value;

use super::client::TikTokClient;
use super::order::status_from_code;
use crate::shared::crypto;
use crate::shared::marketplaces::error::ProviderResult;
use crate::shared::marketplaces::types::WebhookPayload;

pub const ORDER_STATUS_CHANGE: &str = "ORDER_STATUS_CHANGE";

#[derive(Debug, Deserialize)]
pub struct TikTokPush {
    /// Either a name (`ORDER_STATUS_CHANGE`) or a numeric code
    #[serde(rename = "type", default)]
    pub kind: Value,
    #[serde(default)]
    pub shop_id: String,
    #[serde(default)]
    pub timestamp: i64,
    #[serde(default)]
    pub data: TikTokPushData,
}

#[derive(Debug, Default, Deserialize)]
pub struct TikTokPushData {
    #[serde(default)]
    pub order_id: Option<String>,
    /// Numeric status code in order pushes, a name in some older ones
    #[serde(default)]
    pub order_status: Option<Value>,
}

impl TikTokPush {
    pub fn kind(&self) -> String {
        match &self.kind {
            Value::String(s) => s.clone(),
            Value::Number(n) => n.to_string(),
            _ => String::new(),
        }
    }

    /// Order status as text; numeric codes go through [`status_from_code`].
    pub fn order_status(&self) -> Option<String> {
        match self.data.order_status.as_ref()? {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Number(n) => n.as_i64().map(status_from_code),
            _ => None,
        }
    }
}

impl TikTokClient {
    /// `X-Tts-Signature` is `hex(HMAC-SHA256(app_secret, body))`.
    pub fn verify_push(&self, body: &[u8], signature: &str) -> bool {
        crypto::verify_hex(self.app_secret().as_bytes(), body, signature)
    }
}

/// True when the push reports an order status change.
pub fn is_order_status_change(kind: &str) -> bool {
    kind == ORDER_STATUS_CHANGE || kind == "1"
}

pub fn parse_push(body: &[u8]) -> ProviderResult<WebhookPayload> {
    let raw: Value = serde_json::from_slice(body)?;
    let push: TikTokPush = serde_json::from_value(raw.clone())?;
    let kind = push.kind();
    let order_status = push.order_status();
    Ok(WebhookPayload {
        event_type: event_type::from_tiktok_type(&kind, order_status.as_deref()).to_string(),
        shop_id: push.shop_id,
        timestamp: push.timestamp,
        order_id: if is_order_status_change(&kind) {
            push.data.order_id.filter(|s| !s.is_empty())
        } else {
            None
        },
        order_status,
        raw,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::config::TikTokConfig;

    #[test]
    fn test_parse_order_status_change() {
        let body = br#"{"type":"ORDER_STATUS_CHANGE","shop_id":"7001","timestamp":1700000000,"data":{"order_id":"5761","order_status":"AWAITING_SHIPMENT"}}"#;
        let payload = parse_push(body).unwrap();
        assert_eq!(payload.event_type, event_type::TIKTOK_ORDER_CREATED);
        assert_eq!(payload.shop_id, "7001");
        assert_eq!(payload.order_id.as_deref(), Some("5761"));
    }

    #[test]
    fn test_parse_numeric_type_and_product_events() {
        let payload = parse_push(br#"{"type":1,"shop_id":"7001","data":{"order_id":"9","order_status":"CANCELLED"}}"#).unwrap();
        assert_eq!(payload.event_type, event_type::TIKTOK_ORDER_CANCELLED);
        assert_eq!(payload.order_id.as_deref(), Some("9"));

        let payload = parse_push(br#"{"type":"PRODUCT_DELETION","shop_id":"7001","data":{"order_id":"x"}}"#).unwrap();
        assert_eq!(payload.event_type, event_type::TIKTOK_PRODUCT_DELETED);
        assert!(payload.order_id.is_none());
    }

    #[test]
    fn test_parse_numeric_order_status() {
        let body = br#"{"type":"ORDER_STATUS_CHANGE","shop_id":"7001","timestamp":1700000000,"data":{"order_id":"5761","order_status":111}}"#;
        let payload = parse_push(body).unwrap();
        assert_eq!(payload.event_type, event_type::TIKTOK_ORDER_CREATED);
        assert_eq!(payload.order_id.as_deref(), Some("5761"));
        assert_eq!(payload.order_status.as_deref(), Some("pending_shipment"));

        let payload = parse_push(br#"{"type":1,"shop_id":"7001","data":{"order_id":"5761","order_status":140}}"#).unwrap();
        assert_eq!(payload.event_type, event_type::TIKTOK_ORDER_CANCELLED);

        let payload = parse_push(br#"{"type":1,"shop_id":"7001","data":{"order_id":"5761","order_status":999}}"#).unwrap();
        assert_eq!(payload.event_type, event_type::TIKTOK_ORDER_STATUS_CHANGED);
        assert_eq!(payload.order_status.as_deref(), Some("unknown_999"));
    }

    #[test]
    fn test_parse_rejects_invalid_json() {
        assert!(parse_push(b"{").is_err());
    }

    #[test]
    fn test_verify_push() {
        let client = TikTokClient::new(&TikTokConfig {
            app_key: "k".into(),
            app_secret: "app-secret".into(),
            redirect_url: String::new(),
        });
        let body = br#"{"type":"ORDER_STATUS_CHANGE"}"#;
        let sig = crypto::sign_hex(b"app-secret", body);
        assert!(client.verify_push(body, &sig));
        assert!(!client.verify_push(body, ""));
        assert!(!client.verify_push(b"{}", &sig));
    }
}
