pub mod auth;
pub mod catalog;
pub mod comments;
pub mod health;
pub mod reviews;
pub mod titles;
pub mod users;
