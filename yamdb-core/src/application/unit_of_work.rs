use std::any::type_name_of_val;
use std::fmt;
use std::sync::Arc;

use crate::database::infrastructure::memory::InMemoryStore;
use crate::database::infrastructure::postgres::{
    PostgresCatalogRepository, PostgresDatabase, PostgresReviewsRepository,
    PostgresUsersRepository,
};
use crate::database::ports::{
    catalog::CatalogRepository, reviews::ReviewsRepository,
    users::UsersRepository,
};

/// Aggregates all repository ports used by application services.
#[derive(Clone)]
pub struct AppUnitOfWork {
    pub users: Arc<dyn UsersRepository>,
    pub catalog: Arc<dyn CatalogRepository>,
    pub reviews: Arc<dyn ReviewsRepository>,
}

impl fmt::Debug for AppUnitOfWork {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppUnitOfWork")
            .field("users", &type_name_of_val(self.users.as_ref()))
            .field("catalog", &type_name_of_val(self.catalog.as_ref()))
            .field("reviews", &type_name_of_val(self.reviews.as_ref()))
            .finish()
    }
}

impl AppUnitOfWork {
    /// Compose the PostgreSQL-backed adapters over one shared pool.
    pub fn from_postgres(db: &PostgresDatabase) -> Self {
        let pool = db.pool().clone();
        Self {
            users: Arc::new(PostgresUsersRepository::new(pool.clone())),
            catalog: Arc::new(PostgresCatalogRepository::new(pool.clone())),
            reviews: Arc::new(PostgresReviewsRepository::new(pool)),
        }
    }

    /// Every port backed by the same process-local store.
    pub fn in_memory() -> Self {
        let store = Arc::new(InMemoryStore::new());
        Self {
            users: store.clone(),
            catalog: store.clone(),
            reviews: store,
        }
    }
}

/// Incremental construction, mainly for tests that swap a single port.
#[derive(Default)]
pub struct AppUnitOfWorkBuilder {
    users: Option<Arc<dyn UsersRepository>>,
    catalog: Option<Arc<dyn CatalogRepository>>,
    reviews: Option<Arc<dyn ReviewsRepository>>,
}

impl fmt::Debug for AppUnitOfWorkBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppUnitOfWorkBuilder")
            .field("users", &self.users.is_some())
            .field("catalog", &self.catalog.is_some())
            .field("reviews", &self.reviews.is_some())
            .finish()
    }
}

impl AppUnitOfWorkBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_users(mut self, repo: Arc<dyn UsersRepository>) -> Self {
        self.users = Some(repo);
        self
    }

    pub fn with_catalog(mut self, repo: Arc<dyn CatalogRepository>) -> Self {
        self.catalog = Some(repo);
        self
    }

    pub fn with_reviews(mut self, repo: Arc<dyn ReviewsRepository>) -> Self {
        self.reviews = Some(repo);
        self
    }

    /// Fill every port from one in-memory store.
    pub fn with_store(self, store: InMemoryStore) -> Self {
        let store = Arc::new(store);
        self.with_users(store.clone())
            .with_catalog(store.clone())
            .with_reviews(store)
    }

    /// Build a validated AppUnitOfWork. Returns a string error if any required
    /// repository is missing.
    pub fn build(self) -> Result<AppUnitOfWork, String> {
        Ok(AppUnitOfWork {
            users: self
                .users
                .ok_or_else(|| "missing UsersRepository".to_string())?,
            catalog: self
                .catalog
                .ok_or_else(|| "missing CatalogRepository".to_string())?,
            reviews: self
                .reviews
                .ok_or_else(|| "missing ReviewsRepository".to_string())?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_reports_missing_ports() {
        let err = AppUnitOfWorkBuilder::new()
            .with_users(Arc::new(InMemoryStore::new()))
            .build()
            .unwrap_err();
        assert_eq!(err, "missing CatalogRepository");
    }

    #[test]
    fn store_fills_every_port() {
        let uow = AppUnitOfWorkBuilder::new()
            .with_store(InMemoryStore::new())
            .build()
            .unwrap();
        let rendered = format!("{uow:?}");
        assert!(rendered.contains("UsersRepository"));
        assert!(rendered.contains("ReviewsRepository"));
    }
}
