//! # YaMDb Core
//!
//! Core library for the YaMDb review service, providing the domain model,
//! authorization policies, application services and persistence adapters.
//!
//! ## Overview
//!
//! - **Identity**: confirmation-code sign-up, role model and profiles
//! - **Authorization**: pure policies over the acting user and the target
//! - **Catalog**: categories, genres and titles addressed by slug
//! - **Reviews**: one review per author and title, comment threads, and a
//!   rating computed at read time
//! - **Persistence**: repository ports with PostgreSQL and in-memory adapters
//!
//! ## Architecture
//!
//! - [`domain`]: entities, value objects and the policy module
//! - [`database`]: repository ports and their adapters
//! - [`application`]: services combining policies with the ports
//!
//! ## Examples
//!
//! ```no_run
//! use yamdb_core::application::{AppUnitOfWork, CatalogService};
//! use yamdb_core::domain::catalog::TitleFilter;
//!
//! async fn browse() -> yamdb_core::Result<()> {
//!     let uow = AppUnitOfWork::in_memory();
//!     let catalog = CatalogService::new(&uow);
//!     for title in catalog.list_titles(&TitleFilter::default()).await? {
//!         println!("{} ({}): {:?}", title.name, title.year, title.rating);
//!     }
//!     Ok(())
//! }
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod application;
pub mod database;
pub mod domain;
pub mod error;

pub use error::{DomainError, Result};

/// Embedded schema migrations for the PostgreSQL adapter.
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");
