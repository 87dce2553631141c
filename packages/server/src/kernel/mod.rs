//! Kernel module - server infrastructure and dependencies.

pub mod deps;
pub mod memory_store;
pub mod notifications;
pub mod postgres_store;
pub mod test_dependencies;
pub mod traits;

pub use deps::*;
pub use memory_store::MemoryStore;
pub use notifications::*;
pub use postgres_store::PostgresStore;
pub use traits::*;
