//! Domain model: identities, catalog, reviews, and the authorization rules
//! that gate them.

pub mod catalog;
pub mod mail;
pub mod policy;
pub mod reviews;
pub mod tokens;
pub mod users;
