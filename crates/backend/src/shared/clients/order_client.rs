use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Клиент внутреннего сервиса заказов
#[derive(Clone)]
pub struct OrderClient {
    http: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct OrderShippingAddress {
    pub name: String,
    pub phone: String,
    pub address_1: String,
    #[serde(default)]
    pub address_2: String,
    pub city: String,
    pub state: String,
    pub country: String,
    pub postal_code: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItemRequest {
    pub product_id: Option<Uuid>,
    pub variant_id: Option<Uuid>,
    pub sku: String,
    pub name: String,
    pub quantity: i32,
    pub unit_price: f64,
    pub total_price: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateOrderRequest {
    pub external_order_id: String,
    /// Marketplace code (`shopee`, `tiktok`)
    pub source: String,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: String,
    pub shipping_address: OrderShippingAddress,
    pub items: Vec<OrderItemRequest>,
    pub total_amount: f64,
    pub currency: String,
    pub status: String,
    pub paid_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
struct CreateOrderResponse {
    order: CreatedOrder,
}

#[derive(Debug, Deserialize)]
struct CreatedOrder {
    id: Uuid,
}

impl OrderClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            http: super::http_client(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Creates the order and returns its internal id. 200 and 201 are accepted.
    pub async fn create_order(&self, req: &CreateOrderRequest) -> Result<Uuid> {
        let url = format!("{}/api/v1/orders/marketplace", self.base_url);
        let response = self.http.post(&url).json(req).send().await?;
        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        if status != reqwest::StatusCode::OK && status != reqwest::StatusCode::CREATED {
            tracing::error!("Order service rejected order {}: {} {}", req.external_order_id, status, body);
            return Err(anyhow!("order service returned {}: {}", status, body));
        }

        let parsed: CreateOrderResponse = serde_json::from_str(&body)
            .map_err(|e| anyhow!("invalid order service response: {}", e))?;
        Ok(parsed.order.id)
    }

    pub async fn update_order_status(&self, order_id: Uuid, status: &str, tracking_number: Option<&str>) -> Result<()> {
        let url = format!("{}/api/v1/orders/{}/status", self.base_url, order_id);
        let mut body = serde_json::json!({ "status": status });
        if let Some(tracking) = tracking_number.filter(|t| !t.is_empty()) {
            body["tracking_number"] = serde_json::json!(tracking);
        }
        let response = self.http.put(&url).json(&body).send().await?;
        let status_code = response.status();
        if status_code != reqwest::StatusCode::OK {
            let text = response.text().await.unwrap_or_default();
            return Err(anyhow!("order service returned {}: {}", status_code, text));
        }
        Ok(())
    }
}
