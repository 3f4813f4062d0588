//! PostgreSQL infrastructure adapters implementing the database ports.

pub mod repositories;

use std::fmt;
use std::time::Duration;

use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tracing::info;

use crate::error::{DomainError, Result};

pub use repositories::catalog::PostgresCatalogRepository;
pub use repositories::reviews::PostgresReviewsRepository;
pub use repositories::users::PostgresUsersRepository;

/// Owns the connection pool shared by every PostgreSQL repository.
#[derive(Clone)]
pub struct PostgresDatabase {
    pool: PgPool,
}

impl fmt::Debug for PostgresDatabase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PostgresDatabase")
            .field("pool_size", &self.pool.size())
            .field("idle", &self.pool.num_idle())
            .finish()
    }
}

impl PostgresDatabase {
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(10))
            .connect(url)
            .await?;

        info!(max_connections, "connected to PostgreSQL");
        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Apply pending migrations from `migrations/`.
    pub async fn migrate(&self) -> Result<()> {
        crate::MIGRATOR
            .run(&self.pool)
            .await
            .map_err(|e| DomainError::Internal(format!("migration failed: {e}")))?;
        info!("database migrations applied");
        Ok(())
    }
}

/// Translate a failed write into a domain error.
///
/// `conflicts` maps constraint names to the message reported for them;
/// foreign-key violations mean the referenced row vanished mid-request.
pub(crate) fn map_write_error(
    err: sqlx::Error,
    conflicts: &[(&str, &str)],
) -> DomainError {
    if let Some(db_err) = err.as_database_error() {
        if let Some(constraint) = db_err.constraint()
            && let Some((_, message)) =
                conflicts.iter().find(|(name, _)| *name == constraint)
        {
            return DomainError::conflict(*message);
        }
        if db_err.is_unique_violation() {
            return DomainError::conflict(db_err.message().to_string());
        }
        if db_err.is_foreign_key_violation() {
            return DomainError::not_found("referenced record no longer exists");
        }
    }
    DomainError::Database(err)
}

/// `ILIKE` pattern matching `needle` as a literal, case-insensitive
/// substring. Queries must declare `ESCAPE '\'`.
pub(crate) fn substring_pattern(needle: &str) -> String {
    let mut pattern = String::with_capacity(needle.len() + 2);
    pattern.push('%');
    for ch in needle.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    pattern.push('%');
    pattern
}
