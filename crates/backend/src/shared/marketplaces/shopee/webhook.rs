use contracts::domain::a007_webhook_event::aggregate::event_type;
use serde::Deserialize;

use super::client::ShopeeClient;
use crate::shared::crypto;
use crate::shared::marketplaces::error::ProviderResult;
use crate::shared::marketplaces::types::WebhookPayload;

/// Тело push-уведомления Shopee
#[derive(Debug, Deserialize)]
pub struct ShopeePush {
    #[serde(default)]
    pub code: i64,
    #[serde(default)]
    pub shop_id: i64,
    #[serde(default)]
    pub timestamp: i64,
    #[serde(default)]
    pub data: ShopeePushData,
}

#[derive(Debug, Default, Deserialize)]
pub struct ShopeePushData {
    #[serde(default)]
    pub ordersn: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

/// Returns the code Shopee sends when validating a push URL, if the body is such a request.
pub fn push_verification_code(body: &[u8]) -> Option<String> {
    let value: serde_json::Value = serde_json::from_slice(body).ok()?;
    value
        .get("push_verification_code")
        .and_then(|v| v.as_str())
        .map(str::to_string)
}

impl ShopeeClient {
    /// `Authorization` header is `hex(HMAC-SHA256(partner_key, body))`.
    pub fn verify_push(&self, body: &[u8], signature: &str) -> bool {
        crypto::verify_hex(self.partner_key().as_bytes(), body, signature)
    }
}

pub fn parse_push(body: &[u8]) -> ProviderResult<WebhookPayload> {
    let raw: serde_json::Value = serde_json::from_slice(body)?;
    let push: ShopeePush = serde_json::from_value(raw.clone())?;
    Ok(WebhookPayload {
        event_type: event_type::from_shopee_code(push.code, push.data.status.as_deref()).to_string(),
        shop_id: push.shop_id.to_string(),
        timestamp: push.timestamp,
        order_id: push.data.ordersn.filter(|s| !s.is_empty()),
        order_status: push.data.status,
        raw,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::config::ShopeeConfig;

    #[test]
    fn test_parse_order_push() {
        let body = br#"{"code":3,"shop_id":12345,"timestamp":1700000000,"data":{"ordersn":"220101ABC","status":"READY_TO_SHIP"}}"#;
        let payload = parse_push(body).unwrap();
        assert_eq!(payload.event_type, event_type::SHOPEE_ORDER_CREATED);
        assert_eq!(payload.shop_id, "12345");
        assert_eq!(payload.order_id.as_deref(), Some("220101ABC"));
        assert_eq!(payload.raw["code"], 3);
    }

    #[test]
    fn test_parse_non_order_push() {
        let payload = parse_push(br#"{"code":12,"shop_id":1,"timestamp":1,"data":{}}"#).unwrap();
        assert_eq!(payload.event_type, event_type::SHOPEE_AUTHORIZATION_REVOKED);
        assert!(payload.order_id.is_none());
        assert!(parse_push(b"not json").is_err());
    }

    #[test]
    fn test_push_verification_code() {
        assert_eq!(
            push_verification_code(br#"{"push_verification_code":"abc123"}"#).as_deref(),
            Some("abc123")
        );
        assert!(push_verification_code(br#"{"code":3}"#).is_none());
        assert!(push_verification_code(b"").is_none());
    }

    #[test]
    fn test_verify_push() {
        let client = ShopeeClient::new(&ShopeeConfig {
            partner_id: 1,
            partner_key: "pk".into(),
            redirect_url: String::new(),
            sandbox: true,
        });
        let body = br#"{"code":3}"#;
        let sig = crypto::sign_hex(b"pk", body);
        assert!(client.verify_push(body, &sig));
        assert!(!client.verify_push(body, "deadbeef"));
    }
}
