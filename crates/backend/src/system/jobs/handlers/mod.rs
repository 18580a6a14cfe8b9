mod inventory_sync;
mod order_sync;
mod product_push;
mod product_update;
mod token_refresh;

pub use inventory_sync::InventorySyncHandler;
pub use order_sync::OrderSyncHandler;
pub use product_push::ProductPushHandler;
pub use product_update::ProductUpdateHandler;
pub use token_refresh::TokenRefreshHandler;
