//! Repository ports (interfaces) grouped by bounded context.
//!
//! Application services depend only on these traits. Implementations live
//! in the PostgreSQL adapter under `database::infrastructure::postgres` and
//! in the in-memory adapter under `database::infrastructure::memory`.

pub mod catalog;
pub mod reviews;
pub mod users;
