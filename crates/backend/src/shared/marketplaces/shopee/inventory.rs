use reqwest::Method;
use serde_json::{json, Value};

use super::client::{ShopAuth, ShopeeClient};
use super::product::parse_item_id;
use crate::shared::marketplaces::error::ProviderResult;
use crate::shared::marketplaces::types::{InventoryItem, InventoryUpdate, InventoryUpdateResult};

pub const UPDATE_STOCK_PATH: &str = "/api/v2/product/update_stock";

impl ShopeeClient {
    /// Sets the seller stock of the base model (`model_id = 0`).
    pub async fn update_stock(&self, auth: ShopAuth<'_>, item_id: i64, quantity: i32) -> ProviderResult<()> {
        let body = json!({
            "item_id": item_id,
            "stock_list": [{ "model_id": 0, "normal_stock": quantity.max(0) }],
        });
        let _: Value = self
            .call(Method::POST, UPDATE_STOCK_PATH, Some(auth), &[], Some(&body))
            .await?;
        Ok(())
    }

    /// Shopee has no batch stock endpoint; updates are sent one item at a time.
    pub async fn update_inventory(&self, auth: ShopAuth<'_>, updates: &[InventoryUpdate]) -> Vec<InventoryUpdateResult> {
        let mut results = Vec::with_capacity(updates.len());
        for update in updates {
            let outcome = match parse_item_id(&update.external_product_id) {
                Ok(item_id) => self.update_stock(auth, item_id, update.quantity).await,
                Err(e) => Err(e),
            };
            results.push(match outcome {
                Ok(()) => InventoryUpdateResult::ok(update),
                Err(e) => {
                    tracing::warn!("Shopee stock update for item {} failed: {}", update.external_product_id, e);
                    InventoryUpdateResult::failed(update, e)
                }
            });
        }
        results
    }

    pub async fn stock(&self, auth: ShopAuth<'_>, external_product_ids: &[String]) -> ProviderResult<Vec<InventoryItem>> {
        let ids = external_product_ids
            .iter()
            .map(|id| parse_item_id(id))
            .collect::<ProviderResult<Vec<i64>>>()?;
        let mut items = Vec::with_capacity(ids.len());
        for chunk in ids.chunks(50) {
            for info in self.item_base_info(auth, chunk).await? {
                items.push(InventoryItem {
                    external_product_id: info.item_id.to_string(),
                    quantity: info.available_stock(),
                    reserved: info.reserved_stock(),
                    external_sku: info.item_sku,
                });
            }
        }
        Ok(items)
    }
}
