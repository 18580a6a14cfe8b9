use reqwest::Method;
use serde::Deserialize;
use serde_json::{json, Value};

use super::client::{ShopAuth, ShopeeClient};
use crate::shared::marketplaces::error::{ProviderError, ProviderResult};
use crate::shared::marketplaces::types::{
    from_unix, ExternalOrder, ExternalOrderItem, OrderListParams, OrderPage, ShippingAddress,
    TrackingInfo,
};

pub const ORDER_LIST_PATH: &str = "/api/v2/order/get_order_list";
pub const ORDER_DETAIL_PATH: &str = "/api/v2/order/get_order_detail";
pub const SHIP_ORDER_PATH: &str = "/api/v2/logistics/ship_order";

const DETAIL_FIELDS: &str =
    "buyer_user_id,buyer_username,recipient_address,item_list,total_amount,pay_time,shipping_carrier";

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    response: Option<T>,
}

#[derive(Debug, Deserialize)]
struct OrderListResponse {
    #[serde(default)]
    more: bool,
    #[serde(default)]
    next_cursor: String,
    #[serde(default)]
    order_list: Vec<OrderRef>,
}

#[derive(Debug, Deserialize)]
struct OrderRef {
    order_sn: String,
}

#[derive(Debug, Deserialize)]
struct OrderDetailResponse {
    #[serde(default)]
    order_list: Vec<ShopeeOrder>,
}

#[derive(Debug, Deserialize)]
struct ShopeeOrder {
    order_sn: String,
    #[serde(default)]
    order_status: String,
    #[serde(default)]
    create_time: i64,
    #[serde(default)]
    update_time: i64,
    #[serde(default)]
    pay_time: Option<i64>,
    #[serde(default)]
    currency: String,
    #[serde(default)]
    total_amount: f64,
    #[serde(default)]
    buyer_username: String,
    #[serde(default)]
    buyer_user_id: i64,
    #[serde(default)]
    recipient_address: RecipientAddress,
    #[serde(default)]
    item_list: Vec<ShopeeOrderItem>,
    #[serde(default)]
    shipping_carrier: String,
    #[serde(default)]
    tracking_number: String,
}

#[derive(Debug, Default, Deserialize)]
struct RecipientAddress {
    #[serde(default)]
    name: String,
    #[serde(default)]
    phone: String,
    #[serde(default)]
    full_address: String,
    #[serde(default)]
    city: String,
    #[serde(default)]
    state: String,
    #[serde(default)]
    region: String,
    #[serde(default)]
    zipcode: String,
}

#[derive(Debug, Deserialize)]
struct ShopeeOrderItem {
    item_id: i64,
    #[serde(default)]
    item_name: String,
    #[serde(default)]
    item_sku: String,
    #[serde(default)]
    model_sku: String,
    #[serde(default)]
    model_quantity_purchased: i32,
    #[serde(default)]
    model_discounted_price: f64,
    #[serde(default)]
    model_original_price: f64,
}

impl ShopeeOrder {
    fn into_external(self) -> ExternalOrder {
        let items = self
            .item_list
            .into_iter()
            .map(|i| {
                let unit_price = if i.model_discounted_price > 0.0 {
                    i.model_discounted_price
                } else {
                    i.model_original_price
                };
                ExternalOrderItem {
                    external_product_id: i.item_id.to_string(),
                    external_sku: if i.model_sku.is_empty() { i.item_sku } else { i.model_sku },
                    name: i.item_name,
                    quantity: i.model_quantity_purchased,
                    unit_price,
                    total_price: unit_price * i.model_quantity_purchased as f64,
                }
            })
            .collect();
        let addr = self.recipient_address;
        ExternalOrder {
            external_order_id: self.order_sn,
            status: self.order_status.to_lowercase(),
            items,
            buyer_name: self.buyer_username,
            buyer_id: if self.buyer_user_id > 0 { self.buyer_user_id.to_string() } else { String::new() },
            shipping_address: ShippingAddress {
                name: addr.name,
                phone: addr.phone,
                address: addr.full_address,
                city: addr.city,
                state: addr.state,
                country: addr.region,
                zip_code: addr.zipcode,
            },
            total_amount: self.total_amount,
            currency: self.currency,
            created_at: from_unix(self.create_time),
            updated_at: from_unix(self.update_time),
            paid_at: self.pay_time.filter(|t| *t > 0).map(from_unix),
            tracking_number: self.tracking_number,
            carrier: self.shipping_carrier,
        }
    }
}

/// Local status filter to Shopee `order_status`
pub fn to_shopee_status(status: &str) -> Option<&'static str> {
    match status.to_lowercase().as_str() {
        "unpaid" | "pending" | "pending_payment" => Some("UNPAID"),
        "ready_to_ship" | "confirmed" | "pending_shipment" => Some("READY_TO_SHIP"),
        "processed" => Some("PROCESSED"),
        "shipped" => Some("SHIPPED"),
        "completed" | "delivered" => Some("COMPLETED"),
        "in_cancel" => Some("IN_CANCEL"),
        "cancelled" => Some("CANCELLED"),
        "to_return" | "returned" => Some("TO_RETURN"),
        _ => None,
    }
}

impl ShopeeClient {
    async fn order_details(&self, auth: ShopAuth<'_>, order_sns: &[String]) -> ProviderResult<Vec<ExternalOrder>> {
        let mut orders = Vec::with_capacity(order_sns.len());
        // get_order_detail accepts at most 50 order_sn
        for chunk in order_sns.chunks(50) {
            let env: Envelope<OrderDetailResponse> = self
                .call(
                    Method::GET,
                    ORDER_DETAIL_PATH,
                    Some(auth),
                    &[
                        ("order_sn_list", chunk.join(",")),
                        ("response_optional_fields", DETAIL_FIELDS.to_string()),
                    ],
                    None,
                )
                .await?;
            if let Some(resp) = env.response {
                orders.extend(resp.order_list.into_iter().map(ShopeeOrder::into_external));
            }
        }
        Ok(orders)
    }

    pub async fn orders(&self, auth: ShopAuth<'_>, params: &OrderListParams) -> ProviderResult<OrderPage> {
        let mut query = vec![
            ("time_range_field", "create_time".to_string()),
            ("time_from", params.time_from.timestamp().to_string()),
            ("time_to", params.time_to.timestamp().to_string()),
            ("page_size", params.page_size.clamp(1, 100).to_string()),
        ];
        if let Some(cursor) = params.cursor.as_ref().filter(|c| !c.is_empty()) {
            query.push(("cursor", cursor.clone()));
        }
        if let Some(status) = params.status.as_deref().and_then(to_shopee_status) {
            query.push(("order_status", status.to_string()));
        }
        let env: Envelope<OrderListResponse> = self
            .call(Method::GET, ORDER_LIST_PATH, Some(auth), &query, None)
            .await?;
        let Some(list) = env.response else {
            return Ok(OrderPage::default());
        };
        let sns: Vec<String> = list.order_list.into_iter().map(|o| o.order_sn).collect();
        let orders = self.order_details(auth, &sns).await?;
        Ok(OrderPage {
            orders,
            next_cursor: if list.more && !list.next_cursor.is_empty() {
                Some(list.next_cursor)
            } else {
                None
            },
        })
    }

    pub async fn order(&self, auth: ShopAuth<'_>, order_sn: &str) -> ProviderResult<ExternalOrder> {
        self.order_details(auth, &[order_sn.to_string()])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::api("order_not_found", format!("order {} not found", order_sn), 404))
    }

    /// Only `shipped` is pushed to Shopee; other target statuses are managed by the marketplace.
    pub async fn update_order_status(
        &self,
        auth: ShopAuth<'_>,
        order_sn: &str,
        status: &str,
        tracking: Option<&TrackingInfo>,
    ) -> ProviderResult<()> {
        if status != "shipped" {
            tracing::debug!("Shopee order {}: status '{}' is not pushed", order_sn, status);
            return Ok(());
        }
        let mut body = json!({ "order_sn": order_sn });
        if let Some(t) = tracking.filter(|t| !t.tracking_number.is_empty()) {
            body["non_integrated"] = json!({ "tracking_number": t.tracking_number });
        }
        let _: Value = self
            .call(Method::POST, SHIP_ORDER_PATH, Some(auth), &[], Some(&body))
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_detail_mapping() {
        let parsed: OrderDetailResponse = serde_json::from_str(
            r#"{"order_list":[{
                "order_sn": "220101ABC",
                "order_status": "READY_TO_SHIP",
                "create_time": 1700000000,
                "update_time": 1700000600,
                "pay_time": 1700000100,
                "currency": "MYR",
                "total_amount": 59.8,
                "buyer_username": "ali",
                "buyer_user_id": 991,
                "recipient_address": {"name":"Ali","phone":"6012","full_address":"1 Jalan","city":"KL","state":"WP","region":"MY","zipcode":"50000"},
                "item_list": [{"item_id": 800123, "item_name": "Kopi", "item_sku": "KOPI", "model_sku": "", "model_quantity_purchased": 2, "model_discounted_price": 29.9}],
                "shipping_carrier": "J&T"
            }]}"#,
        )
        .unwrap();
        let order = parsed.order_list.into_iter().next().unwrap().into_external();
        assert_eq!(order.external_order_id, "220101ABC");
        assert_eq!(order.status, "ready_to_ship");
        assert_eq!(order.buyer_id, "991");
        assert_eq!(order.shipping_address.country, "MY");
        assert_eq!(order.items[0].external_sku, "KOPI");
        assert!((order.items[0].total_price - 59.8).abs() < 1e-9);
        assert_eq!(order.created_at.timestamp(), 1_700_000_000);
        assert_eq!(order.paid_at.map(|t| t.timestamp()), Some(1_700_000_100));
        assert_eq!(order.carrier, "J&T");
    }

    #[test]
    fn test_to_shopee_status() {
        assert_eq!(to_shopee_status("pending"), Some("UNPAID"));
        assert_eq!(to_shopee_status("SHIPPED"), Some("SHIPPED"));
        assert_eq!(to_shopee_status("delivered"), Some("COMPLETED"));
        assert_eq!(to_shopee_status("refunded"), None);
    }
}
