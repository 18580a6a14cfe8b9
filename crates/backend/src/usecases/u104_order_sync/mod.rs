pub mod executor;
pub mod mapper;
pub mod service;

pub use executor::run_order_job;
pub use service::*;
