pub mod error;
pub mod shopee;
pub mod tiktok;
pub mod types;

use async_trait::async_trait;
use contracts::enums::Platform;
use once_cell::sync::OnceCell;
use std::collections::HashMap;
use std::sync::Arc;

use crate::shared::config::Config;
pub use error::{ProviderError, ProviderResult};
use types::*;

static REGISTRY: OnceCell<ProviderRegistry> = OnceCell::new();

/// Общий интерфейс адаптеров маркетплейсов
///
/// Методы, работающие от имени магазина, получают расшифрованный
/// `access_token` и `shop_id` при каждом вызове; адаптер не хранит состояние
/// конкретного подключения.
#[async_trait]
pub trait MarketplaceProvider: Send + Sync {
    fn platform(&self) -> Platform;

    // OAuth
    fn auth_url(&self, state: &str) -> String;
    async fn exchange_code(&self, code: &str, shop_id: Option<&str>) -> ProviderResult<TokenResponse>;
    async fn refresh_token(&self, refresh_token: &str, shop_id: Option<&str>) -> ProviderResult<TokenResponse>;

    async fn shop_info(&self, access_token: &str, shop_id: &str) -> ProviderResult<ShopInfo>;

    // Products
    async fn push_product(
        &self,
        access_token: &str,
        shop_id: &str,
        req: &ProductPushRequest,
    ) -> ProviderResult<ProductPushResponse>;
    async fn update_product(
        &self,
        access_token: &str,
        shop_id: &str,
        external_id: &str,
        req: &ProductUpdateRequest,
    ) -> ProviderResult<()>;
    async fn delete_product(&self, access_token: &str, shop_id: &str, external_id: &str) -> ProviderResult<()>;
    /// One page of the shop catalogue; `page` starts at 1.
    async fn list_products(
        &self,
        access_token: &str,
        shop_id: &str,
        page: u32,
        page_size: u32,
    ) -> ProviderResult<ProductPage>;
    async fn categories(&self, access_token: &str, shop_id: &str) -> ProviderResult<Vec<ExternalCategory>>;

    // Inventory
    async fn update_inventory(
        &self,
        access_token: &str,
        shop_id: &str,
        updates: &[InventoryUpdate],
    ) -> ProviderResult<Vec<InventoryUpdateResult>>;
    async fn inventory(
        &self,
        access_token: &str,
        shop_id: &str,
        external_product_ids: &[String],
    ) -> ProviderResult<Vec<InventoryItem>>;

    // Orders
    async fn orders(&self, access_token: &str, shop_id: &str, params: &OrderListParams) -> ProviderResult<OrderPage>;
    async fn order(&self, access_token: &str, shop_id: &str, external_id: &str) -> ProviderResult<ExternalOrder>;
    async fn update_order_status(
        &self,
        access_token: &str,
        shop_id: &str,
        external_id: &str,
        status: &str,
        tracking: Option<&TrackingInfo>,
    ) -> ProviderResult<()>;

    // Webhooks
    fn verify_webhook(&self, body: &[u8], signature: &str) -> bool;
    fn parse_webhook(&self, body: &[u8]) -> ProviderResult<WebhookPayload>;
}

/// Реестр настроенных адаптеров
#[derive(Clone, Default)]
pub struct ProviderRegistry {
    providers: HashMap<Platform, Arc<dyn MarketplaceProvider>>,
}

impl ProviderRegistry {
    /// Registers only the platforms that have credentials in the config.
    pub fn from_config(config: &Config) -> Self {
        let mut registry = Self::default();
        if config.shopee.is_configured() {
            registry.register(Arc::new(shopee::ShopeeProvider::new(&config.shopee)));
        } else {
            tracing::warn!("Shopee is not configured, its endpoints will return 503");
        }
        if config.tiktok.is_configured() {
            registry.register(Arc::new(tiktok::TikTokProvider::new(&config.tiktok)));
        } else {
            tracing::warn!("TikTok Shop is not configured, its endpoints will return 503");
        }
        registry
    }

    pub fn register(&mut self, provider: Arc<dyn MarketplaceProvider>) {
        self.providers.insert(provider.platform(), provider);
    }

    pub fn get(&self, platform: Platform) -> Option<Arc<dyn MarketplaceProvider>> {
        self.providers.get(&platform).cloned()
    }

    pub fn platforms(&self) -> Vec<Platform> {
        Platform::all()
            .into_iter()
            .filter(|p| self.providers.contains_key(p))
            .collect()
    }
}

pub fn init_providers(config: &Config) {
    let registry = ProviderRegistry::from_config(config);
    tracing::info!("Marketplace providers registered: {:?}", registry.platforms());
    if REGISTRY.set(registry).is_err() {
        tracing::warn!("Provider registry already initialized");
    }
}

/// Returns the provider for a platform, if it is configured.
pub fn provider(platform: Platform) -> Option<Arc<dyn MarketplaceProvider>> {
    REGISTRY.get().and_then(|r| r.get(platform))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_only_contains_configured_platforms() {
        let mut config = Config::default();
        assert!(ProviderRegistry::from_config(&config).platforms().is_empty());

        config.tiktok.app_key = "key".into();
        config.tiktok.app_secret = "secret".into();
        let registry = ProviderRegistry::from_config(&config);
        assert_eq!(registry.platforms(), vec![Platform::TikTok]);
        assert!(registry.get(Platform::Shopee).is_none());

        config.shopee.partner_id = 1000;
        config.shopee.partner_key = "pk".into();
        let registry = ProviderRegistry::from_config(&config);
        assert_eq!(registry.platforms(), vec![Platform::Shopee, Platform::TikTok]);
        assert_eq!(registry.get(Platform::Shopee).map(|p| p.platform()), Some(Platform::Shopee));
    }
}
