use reqwest::Method;
use serde::Deserialize;
use serde_json::{json, Value};

use super::client::TikTokClient;
use super::product::parse_price;
use crate::shared::marketplaces::error::ProviderResult;
use crate::shared::marketplaces::types::{
    from_unix, ExternalOrder, ExternalOrderItem, OrderListParams, OrderPage, ShippingAddress,
    TrackingInfo,
};

pub const ORDER_LIST_PATH: &str = "/api/orders/search";
pub const ORDER_DETAIL_PATH: &str = "/api/orders/detail/query";
pub const SHIP_ORDER_PATH: &str = "/api/fulfillment/package/ship";

#[derive(Debug, Deserialize)]
struct OrderListData {
    #[serde(default)]
    next_cursor: String,
    #[serde(default)]
    orders: Vec<TikTokOrder>,
}

#[derive(Debug, Deserialize)]
struct TikTokOrder {
    order_id: String,
    #[serde(default)]
    order_status: i64,
    #[serde(default)]
    create_time: i64,
    #[serde(default)]
    update_time: i64,
    #[serde(default)]
    paid_time: Option<i64>,
    #[serde(default)]
    total_amount: String,
    #[serde(default)]
    currency: String,
    #[serde(default)]
    buyer_uid: String,
    #[serde(default)]
    recipient_address: RecipientAddress,
    #[serde(default)]
    line_items: Vec<LineItem>,
    #[serde(default)]
    tracking_number: String,
    #[serde(default)]
    shipping_provider: String,
}

#[derive(Debug, Default, Deserialize)]
struct RecipientAddress {
    #[serde(default)]
    name: String,
    #[serde(default)]
    phone_number: String,
    #[serde(default)]
    address_line1: String,
    #[serde(default)]
    city: String,
    #[serde(default)]
    state: String,
    #[serde(default)]
    postal_code: String,
    #[serde(default)]
    region_code: String,
}

#[derive(Debug, Deserialize)]
struct LineItem {
    #[serde(default)]
    sku_id: String,
    #[serde(default)]
    product_id: String,
    #[serde(default)]
    product_name: String,
    #[serde(default)]
    quantity: i32,
    #[serde(default)]
    sale_price: String,
}

/// TikTok numeric order status to its text form
pub fn status_from_code(code: i64) -> String {
    match code {
        100 => "pending_payment".to_string(),
        111 | 112 => "pending_shipment".to_string(),
        121 => "shipped".to_string(),
        130 => "completed".to_string(),
        140 => "cancelled".to_string(),
        other => format!("unknown_{}", other),
    }
}

/// Reverse of [`status_from_code`], used for list filters. Unknown is `None`.
pub fn status_to_code(status: &str) -> Option<i64> {
    match status {
        "pending_payment" | "pending" => Some(100),
        "pending_shipment" | "confirmed" => Some(111),
        "shipped" => Some(121),
        "completed" | "delivered" => Some(130),
        "cancelled" => Some(140),
        _ => None,
    }
}

impl TikTokOrder {
    fn into_external(self) -> ExternalOrder {
        let items = self
            .line_items
            .into_iter()
            .map(|item| {
                let price = parse_price(&item.sale_price);
                ExternalOrderItem {
                    external_product_id: item.product_id,
                    external_sku: item.sku_id,
                    name: item.product_name,
                    quantity: item.quantity,
                    unit_price: price,
                    total_price: price * item.quantity as f64,
                }
            })
            .collect();
        let addr = self.recipient_address;
        ExternalOrder {
            external_order_id: self.order_id,
            status: status_from_code(self.order_status),
            items,
            buyer_name: addr.name.clone(),
            buyer_id: self.buyer_uid,
            shipping_address: ShippingAddress {
                name: addr.name,
                phone: addr.phone_number,
                address: addr.address_line1,
                city: addr.city,
                state: addr.state,
                country: addr.region_code,
                zip_code: addr.postal_code,
            },
            total_amount: parse_price(&self.total_amount),
            currency: self.currency,
            created_at: from_unix(self.create_time),
            updated_at: from_unix(self.update_time),
            paid_at: self.paid_time.filter(|t| *t > 0).map(from_unix),
            tracking_number: self.tracking_number,
            carrier: self.shipping_provider,
        }
    }
}

fn order_search_body(params: &OrderListParams) -> Value {
    let mut body = json!({
        "create_time_ge": params.time_from.timestamp(),
        "create_time_lt": params.time_to.timestamp(),
        "page_size": params.page_size.clamp(1, 100),
    });
    if let Some(cursor) = params.cursor.as_ref().filter(|c| !c.is_empty()) {
        body["cursor"] = json!(cursor);
    }
    if let Some(code) = params.status.as_deref().and_then(status_to_code) {
        body["order_status"] = json!(code);
    }
    body
}

impl TikTokClient {
    pub async fn orders(&self, access_token: &str, shop_id: &str, params: &OrderListParams) -> ProviderResult<OrderPage> {
        let body = order_search_body(params);
        let data: Option<OrderListData> = self
            .call(Method::POST, ORDER_LIST_PATH, Some(access_token), Some(shop_id), &[], Some(&body))
            .await?;
        let Some(data) = data else {
            return Ok(OrderPage::default());
        };
        Ok(OrderPage {
            orders: data.orders.into_iter().map(TikTokOrder::into_external).collect(),
            next_cursor: Some(data.next_cursor).filter(|c| !c.is_empty()),
        })
    }

    pub async fn order(&self, access_token: &str, shop_id: &str, order_id: &str) -> ProviderResult<ExternalOrder> {
        let body = json!({ "order_id": order_id });
        let order: TikTokOrder = self
            .call_data(Method::POST, ORDER_DETAIL_PATH, Some(access_token), Some(shop_id), &[], Some(&body))
            .await?;
        Ok(order.into_external())
    }

    /// Only `shipped` maps to a TikTok call; other statuses are no-ops.
    pub async fn update_order_status(
        &self,
        access_token: &str,
        shop_id: &str,
        order_id: &str,
        status: &str,
        tracking: Option<&TrackingInfo>,
    ) -> ProviderResult<()> {
        if status != "shipped" {
            return Ok(());
        }
        let mut body = json!({ "order_id": order_id });
        if let Some(t) = tracking.filter(|t| !t.tracking_number.is_empty()) {
            body["tracking_number"] = json!(t.tracking_number);
            if !t.courier.is_empty() {
                body["shipping_provider"] = json!(t.courier);
            }
        }
        let _: Option<Value> = self
            .call(Method::POST, SHIP_ORDER_PATH, Some(access_token), Some(shop_id), &[], Some(&body))
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_status_code_map() {
        assert_eq!(status_from_code(100), "pending_payment");
        assert_eq!(status_from_code(111), "pending_shipment");
        assert_eq!(status_from_code(112), "pending_shipment");
        assert_eq!(status_from_code(121), "shipped");
        assert_eq!(status_from_code(130), "completed");
        assert_eq!(status_from_code(140), "cancelled");
        assert_eq!(status_from_code(999), "unknown_999");

        for code in [100, 111, 121, 130, 140] {
            assert_eq!(status_to_code(&status_from_code(code)), Some(code));
        }
        assert_eq!(status_to_code("unknown_5"), None);
    }

    #[test]
    fn test_order_search_body() {
        let params = OrderListParams {
            time_from: Utc.timestamp_opt(1_700_000_000, 0).unwrap(),
            time_to: Utc.timestamp_opt(1_700_086_400, 0).unwrap(),
            status: Some("shipped".into()),
            page_size: 20,
            cursor: Some("c2".into()),
        };
        let body = order_search_body(&params);
        assert_eq!(body["create_time_ge"], 1_700_000_000i64);
        assert_eq!(body["create_time_lt"], 1_700_086_400i64);
        assert_eq!(body["page_size"], 20);
        assert_eq!(body["cursor"], "c2");
        assert_eq!(body["order_status"], 121);

        let bare = order_search_body(&OrderListParams {
            status: Some("weird".into()),
            cursor: None,
            ..params
        });
        assert!(bare.get("order_status").is_none());
        assert!(bare.get("cursor").is_none());
    }

    #[test]
    fn test_order_mapping() {
        let data: OrderListData = serde_json::from_str(
            r#"{"next_cursor":"","orders":[{
                "order_id":"5761",
                "order_status":111,
                "create_time":1700000000,
                "update_time":1700000300,
                "total_amount":"31.00",
                "currency":"MYR",
                "recipient_address":{"name":"Siti","phone_number":"6019","address_line1":"2 Jalan","city":"Shah Alam","state":"Selangor","postal_code":"40000","region_code":"MY"},
                "line_items":[{"sku_id":"sku-1","product_id":"1729","product_name":"Teh","quantity":2,"sale_price":"15.50"}],
                "tracking_number":"",
                "shipping_provider":"Ninja Van"
            }]}"#,
        )
        .unwrap();
        let order = data.orders.into_iter().next().unwrap().into_external();
        assert_eq!(order.status, "pending_shipment");
        assert_eq!(order.total_amount, 31.0);
        assert_eq!(order.items[0].total_price, 31.0);
        assert_eq!(order.shipping_address.zip_code, "40000");
        assert_eq!(order.buyer_name, "Siti");
        assert_eq!(order.carrier, "Ninja Van");
        assert!(order.paid_at.is_none());
    }
}
