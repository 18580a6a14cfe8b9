pub mod executor;
pub mod import;
pub mod mapper;
pub mod service;

pub use executor::run_product_job;
pub use import::{import_products, imported_products};
pub use service::*;
