//! Common types shared by all aggregates

pub mod aggregate_id;
pub mod listing_status;
pub mod paging;
pub mod seller_status;

// Re-exports
pub use aggregate_id::AggregateId;
pub use listing_status::ListingStatus;
pub use paging::{PageRequest, Paged};
pub use seller_status::SellerStatus;
