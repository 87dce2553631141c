// Common types and utilities shared across the application

pub mod contact;
pub mod entity_ids;

pub use contact::*;
pub use entity_ids::*;
