pub mod handler;
pub mod handlers;
pub mod initialization;
pub mod logger;
pub mod registry;
pub mod scheduler;
pub mod worker;
