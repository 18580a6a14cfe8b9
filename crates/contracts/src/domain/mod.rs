pub mod a001_connection;
pub mod a002_sync_job;
pub mod a003_product_mapping;
pub mod a004_category_mapping;
pub mod a005_imported_product;
pub mod a006_marketplace_order;
pub mod a007_webhook_event;
pub mod common;
