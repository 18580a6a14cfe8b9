pub mod error;
pub mod service;

pub use error::ConnectionError;
pub use service::*;
