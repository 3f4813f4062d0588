//! Persistence: repository ports and the adapters implementing them.

pub mod infrastructure;
pub mod ports;

pub use infrastructure::memory::InMemoryStore;
pub use infrastructure::postgres::PostgresDatabase;
