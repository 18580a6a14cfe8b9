use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Клиент внутреннего каталога товаров
#[derive(Clone)]
pub struct CatalogClient {
    http: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogVariant {
    pub id: Uuid,
    #[serde(default)]
    pub sku: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub price: f64,
    #[serde(default)]
    pub stock: i32,
    #[serde(default)]
    pub image_url: String,
}

/// Товар внутреннего каталога
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogProduct {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub price: f64,
    #[serde(default)]
    pub compare_at_price: Option<f64>,
    #[serde(default)]
    pub sku: String,
    #[serde(default)]
    pub stock: i32,
    #[serde(default)]
    pub category_id: Option<Uuid>,
    #[serde(default)]
    pub images: Vec<String>,
    /// Grams
    #[serde(default)]
    pub weight: f64,
    #[serde(default)]
    pub length: Option<f64>,
    #[serde(default)]
    pub width: Option<f64>,
    #[serde(default)]
    pub height: Option<f64>,
    #[serde(default)]
    pub brand: String,
    #[serde(default)]
    pub variants: Vec<CatalogVariant>,
}

/// The catalog answers either with the product itself or wrapped in `product` / `data`.
fn unwrap_product(value: serde_json::Value) -> Result<CatalogProduct> {
    let inner = match value {
        serde_json::Value::Object(mut map) => {
            if let Some(p) = map.remove("product") {
                p
            } else if let Some(p) = map.remove("data") {
                p
            } else {
                serde_json::Value::Object(map)
            }
        }
        other => other,
    };
    serde_json::from_value(inner).map_err(|e| anyhow!("invalid catalog product: {}", e))
}

impl CatalogClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            http: super::http_client(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub async fn get_product(&self, id: Uuid) -> Result<CatalogProduct> {
        let url = format!("{}/api/v1/products/{}", self.base_url, id);
        let response = self.http.get(&url).send().await?;
        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(anyhow!("product {} not found in catalog", id));
        }
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            tracing::error!("Catalog request for {} failed: {} {}", id, status, text);
            return Err(anyhow!("catalog service returned {}: {}", status, text));
        }
        let value: serde_json::Value = response.json().await?;
        unwrap_product(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unwrap_product_variants() {
        let id = Uuid::new_v4();
        let direct = serde_json::json!({ "id": id, "name": "Kopi", "price": 25.0 });
        let wrapped = serde_json::json!({ "product": { "id": id, "name": "Kopi" } });
        let data = serde_json::json!({ "data": { "id": id, "name": "Kopi", "images": ["a.jpg"] } });

        assert_eq!(unwrap_product(direct).unwrap().price, 25.0);
        assert_eq!(unwrap_product(wrapped).unwrap().id, id);
        assert_eq!(unwrap_product(data).unwrap().images, vec!["a.jpg".to_string()]);
        assert!(unwrap_product(serde_json::json!({ "name": "no id" })).is_err());
    }
}
