//! Shopee Open Platform v2 adapter.

pub mod auth;
pub mod client;
pub mod inventory;
pub mod order;
pub mod product;
pub mod webhook;

use async_trait::async_trait;
use contracts::enums::Platform;

use super::error::ProviderResult;
use super::types::*;
use super::MarketplaceProvider;
use crate::shared::config::ShopeeConfig;
use client::{ShopAuth, ShopeeClient};

pub struct ShopeeProvider {
    client: ShopeeClient,
    redirect_url: String,
}

impl ShopeeProvider {
    pub fn new(config: &ShopeeConfig) -> Self {
        Self {
            client: ShopeeClient::new(config),
            redirect_url: config.redirect_url.clone(),
        }
    }
}

#[async_trait]
impl MarketplaceProvider for ShopeeProvider {
    fn platform(&self) -> Platform {
        Platform::Shopee
    }

    fn auth_url(&self, state: &str) -> String {
        self.client
            .auth_url_at(chrono::Utc::now().timestamp(), &self.redirect_url, state)
    }

    async fn exchange_code(&self, code: &str, shop_id: Option<&str>) -> ProviderResult<TokenResponse> {
        self.client.exchange_code(code, shop_id).await
    }

    async fn refresh_token(&self, refresh_token: &str, shop_id: Option<&str>) -> ProviderResult<TokenResponse> {
        self.client.refresh_access_token(refresh_token, shop_id).await
    }

    async fn shop_info(&self, access_token: &str, shop_id: &str) -> ProviderResult<ShopInfo> {
        self.client.shop_info(ShopAuth::new(access_token, shop_id)?).await
    }

    async fn push_product(
        &self,
        access_token: &str,
        shop_id: &str,
        req: &ProductPushRequest,
    ) -> ProviderResult<ProductPushResponse> {
        self.client.add_item(ShopAuth::new(access_token, shop_id)?, req).await
    }

    async fn update_product(
        &self,
        access_token: &str,
        shop_id: &str,
        external_id: &str,
        req: &ProductUpdateRequest,
    ) -> ProviderResult<()> {
        self.client
            .update_item(ShopAuth::new(access_token, shop_id)?, external_id, req)
            .await
    }

    async fn delete_product(&self, access_token: &str, shop_id: &str, external_id: &str) -> ProviderResult<()> {
        self.client
            .delete_item(ShopAuth::new(access_token, shop_id)?, external_id)
            .await
    }

    async fn list_products(
        &self,
        access_token: &str,
        shop_id: &str,
        page: u32,
        page_size: u32,
    ) -> ProviderResult<ProductPage> {
        self.client
            .list_items(ShopAuth::new(access_token, shop_id)?, page, page_size)
            .await
    }

    async fn categories(&self, access_token: &str, shop_id: &str) -> ProviderResult<Vec<ExternalCategory>> {
        self.client.categories(ShopAuth::new(access_token, shop_id)?).await
    }

    async fn update_inventory(
        &self,
        access_token: &str,
        shop_id: &str,
        updates: &[InventoryUpdate],
    ) -> ProviderResult<Vec<InventoryUpdateResult>> {
        let auth = ShopAuth::new(access_token, shop_id)?;
        Ok(self.client.update_inventory(auth, updates).await)
    }

    async fn inventory(
        &self,
        access_token: &str,
        shop_id: &str,
        external_product_ids: &[String],
    ) -> ProviderResult<Vec<InventoryItem>> {
        self.client
            .stock(ShopAuth::new(access_token, shop_id)?, external_product_ids)
            .await
    }

    async fn orders(&self, access_token: &str, shop_id: &str, params: &OrderListParams) -> ProviderResult<OrderPage> {
        self.client.orders(ShopAuth::new(access_token, shop_id)?, params).await
    }

    async fn order(&self, access_token: &str, shop_id: &str, external_id: &str) -> ProviderResult<ExternalOrder> {
        self.client
            .order(ShopAuth::new(access_token, shop_id)?, external_id)
            .await
    }

    async fn update_order_status(
        &self,
        access_token: &str,
        shop_id: &str,
        external_id: &str,
        status: &str,
        tracking: Option<&TrackingInfo>,
    ) -> ProviderResult<()> {
        self.client
            .update_order_status(ShopAuth::new(access_token, shop_id)?, external_id, status, tracking)
            .await
    }

    fn verify_webhook(&self, body: &[u8], signature: &str) -> bool {
        self.client.verify_push(body, signature)
    }

    fn parse_webhook(&self, body: &[u8]) -> ProviderResult<WebhookPayload> {
        webhook::parse_push(body)
    }
}
