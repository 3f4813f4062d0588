//! PostgreSQL-backed repository implementations.

pub mod catalog;
pub mod reviews;
pub mod users;
