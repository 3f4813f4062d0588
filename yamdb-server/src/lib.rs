//! # YaMDb Server
//!
//! HTTP surface of the YaMDb review service.
//!
//! - **Accounts**: sign-up by emailed confirmation code, JWT access and
//!   refresh tokens, self-service profiles and user administration
//! - **Catalog**: categories, genres and titles with a computed rating
//! - **Reviews**: one review per author and title, with comment threads
//!
//! Built on Axum; storage is PostgreSQL, or an in-memory store when no
//! database is configured.

pub mod auth;
pub mod handlers;
pub mod infra;
pub mod routes;

pub use infra::app_state::AppState;
pub use routes::create_app;
