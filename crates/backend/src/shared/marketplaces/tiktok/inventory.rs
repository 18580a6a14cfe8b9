use reqwest::Method;
use serde_json::{json, Value};

use super::client::TikTokClient;
use crate::shared::marketplaces::error::ProviderResult;
use crate::shared::marketplaces::types::{InventoryItem, InventoryUpdate, InventoryUpdateResult};

pub const UPDATE_STOCK_PATH: &str = "/api/products/stocks";

fn stock_body(update: &InventoryUpdate) -> Value {
    json!({
        "skus": [{
            "product_id": update.external_product_id,
            "id": update.external_sku,
            "stock_infos": [{ "available_stock": update.quantity.max(0) }],
        }]
    })
}

impl TikTokClient {
    pub async fn update_stock(&self, access_token: &str, shop_id: &str, update: &InventoryUpdate) -> ProviderResult<()> {
        let body = stock_body(update);
        let _: Option<Value> = self
            .call(Method::PUT, UPDATE_STOCK_PATH, Some(access_token), Some(shop_id), &[], Some(&body))
            .await?;
        Ok(())
    }

    pub async fn update_inventory(
        &self,
        access_token: &str,
        shop_id: &str,
        updates: &[InventoryUpdate],
    ) -> Vec<InventoryUpdateResult> {
        let mut results = Vec::with_capacity(updates.len());
        for update in updates {
            results.push(match self.update_stock(access_token, shop_id, update).await {
                Ok(()) => InventoryUpdateResult::ok(update),
                Err(e) => {
                    tracing::warn!(
                        "TikTok stock update for {}/{} failed: {}",
                        update.external_product_id,
                        update.external_sku,
                        e
                    );
                    InventoryUpdateResult::failed(update, e)
                }
            });
        }
        results
    }

    /// One item per SKU; quantity is the first warehouse's available stock.
    pub async fn stock(
        &self,
        access_token: &str,
        shop_id: &str,
        external_product_ids: &[String],
    ) -> ProviderResult<Vec<InventoryItem>> {
        let body = json!({ "product_ids": external_product_ids });
        let data = self.search_products(access_token, shop_id, &body).await?;
        let mut items = Vec::new();
        for product in data.products {
            for sku in &product.skus {
                items.push(InventoryItem {
                    external_product_id: product.product_id.clone(),
                    external_sku: sku.id.clone(),
                    quantity: sku.available_stock(),
                    reserved: 0,
                });
            }
        }
        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stock_body() {
        let body = stock_body(&InventoryUpdate {
            external_product_id: "1729".into(),
            external_sku: "sku-1".into(),
            quantity: -3,
        });
        assert_eq!(body["skus"][0]["product_id"], "1729");
        assert_eq!(body["skus"][0]["id"], "sku-1");
        assert_eq!(body["skus"][0]["stock_infos"][0]["available_stock"], 0);
    }
}
