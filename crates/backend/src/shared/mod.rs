pub mod clients;
pub mod config;
pub mod crypto;
pub mod data;
pub mod events;
pub mod format;
pub mod marketplaces;
