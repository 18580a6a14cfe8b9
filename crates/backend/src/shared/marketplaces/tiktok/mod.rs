//! TikTok Shop Open API adapter.

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
use crate::shared::config::TikTokConfig;
use client::TikTokClient;

pub struct TikTokProvider {
    client: TikTokClient,
}

impl TikTokProvider {
    pub fn new(config: &TikTokConfig) -> Self {
        Self {
            client: TikTokClient::new(config),
        }
    }
}

#[async_trait]
impl MarketplaceProvider for TikTokProvider {
    fn platform(&self) -> Platform {
        Platform::TikTok
    }

    fn auth_url(&self, state: &str) -> String {
        self.client.auth_url(state)
    }

    async fn exchange_code(&self, code: &str, _shop_id: Option<&str>) -> ProviderResult<TokenResponse> {
        self.client.exchange_code(code).await
    }

    async fn refresh_token(&self, refresh_token: &str, _shop_id: Option<&str>) -> ProviderResult<TokenResponse> {
        self.client.refresh_access_token(refresh_token).await
    }

    async fn shop_info(&self, access_token: &str, shop_id: &str) -> ProviderResult<ShopInfo> {
        self.client.shop_info(access_token, shop_id).await
    }

    async fn push_product(
        &self,
        access_token: &str,
        shop_id: &str,
        req: &ProductPushRequest,
    ) -> ProviderResult<ProductPushResponse> {
        self.client.create_product(access_token, shop_id, req).await
    }

    async fn update_product(
        &self,
        access_token: &str,
        shop_id: &str,
        external_id: &str,
        req: &ProductUpdateRequest,
    ) -> ProviderResult<()> {
        self.client
            .update_product(access_token, shop_id, external_id, req)
            .await
    }

    async fn delete_product(&self, access_token: &str, shop_id: &str, external_id: &str) -> ProviderResult<()> {
        self.client.delete_product(access_token, shop_id, external_id).await
    }

    async fn list_products(
        &self,
        access_token: &str,
        shop_id: &str,
        page: u32,
        page_size: u32,
    ) -> ProviderResult<ProductPage> {
        self.client
            .list_products(access_token, shop_id, page, page_size)
            .await
    }

    async fn categories(&self, access_token: &str, shop_id: &str) -> ProviderResult<Vec<ExternalCategory>> {
        self.client.categories(access_token, shop_id).await
    }

    async fn update_inventory(
        &self,
        access_token: &str,
        shop_id: &str,
        updates: &[InventoryUpdate],
    ) -> ProviderResult<Vec<InventoryUpdateResult>> {
        Ok(self.client.update_inventory(access_token, shop_id, updates).await)
    }

    async fn inventory(
        &self,
        access_token: &str,
        shop_id: &str,
        external_product_ids: &[String],
    ) -> ProviderResult<Vec<InventoryItem>> {
        self.client
            .stock(access_token, shop_id, external_product_ids)
            .await
    }

    async fn orders(&self, access_token: &str, shop_id: &str, params: &OrderListParams) -> ProviderResult<OrderPage> {
        self.client.orders(access_token, shop_id, params).await
    }

    async fn order(&self, access_token: &str, shop_id: &str, external_id: &str) -> ProviderResult<ExternalOrder> {
        self.client.order(access_token, shop_id, external_id).await
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
            .update_order_status(access_token, shop_id, external_id, status, tracking)
            .await
    }

    fn verify_webhook(&self, body: &[u8], signature: &str) -> bool {
        self.client.verify_push(body, signature)
    }

    fn parse_webhook(&self, body: &[u8]) -> ProviderResult<WebhookPayload> {
        webhook::parse_push(body)
    }
}
