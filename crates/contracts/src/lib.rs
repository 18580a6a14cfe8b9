//! Shared types of the marketplace sync service: domain aggregates, DTOs
//! exchanged over HTTP and the payloads of in-process events.

pub mod domain;
pub mod enums;
pub mod events;
