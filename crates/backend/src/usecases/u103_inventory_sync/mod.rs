pub mod executor;
pub mod service;

pub use executor::run_inventory_job;
pub use service::*;
