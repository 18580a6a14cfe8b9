pub mod catalog_client;
pub mod order_client;

use once_cell::sync::OnceCell;

use crate::shared::config::ServicesConfig;
pub use catalog_client::{CatalogClient, CatalogProduct, CatalogVariant};
pub use order_client::{CreateOrderRequest, OrderClient, OrderItemRequest, OrderShippingAddress};

static ORDER_CLIENT: OnceCell<OrderClient> = OnceCell::new();
static CATALOG_CLIENT: OnceCell<CatalogClient> = OnceCell::new();

const TIMEOUT_SECS: u64 = 30;

pub(crate) fn http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(TIMEOUT_SECS))
        .build()
        .unwrap_or_else(|_| reqwest::Client::new())
}

pub fn init_clients(config: &ServicesConfig) {
    let _ = ORDER_CLIENT.set(OrderClient::new(&config.order_service_url));
    let _ = CATALOG_CLIENT.set(CatalogClient::new(&config.catalog_service_url));
    tracing::info!(
        "Internal services: orders at {}, catalog at {}",
        config.order_service_url,
        config.catalog_service_url
    );
}

/// Client of the internal order service; falls back to the configured URL if not initialized.
pub fn order_client() -> &'static OrderClient {
    ORDER_CLIENT.get_or_init(|| {
        OrderClient::new(&crate::shared::config::get_config().services.order_service_url)
    })
}

pub fn catalog_client() -> &'static CatalogClient {
    CATALOG_CLIENT.get_or_init(|| {
        CatalogClient::new(&crate::shared::config::get_config().services.catalog_service_url)
    })
}
