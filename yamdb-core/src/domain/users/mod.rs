//! User-domain boundary.
//!
//! Groups the identity record, its role model and the validated value
//! objects used by registration and administration.

pub mod role;
pub mod user;
pub mod value_objects;

pub use role::UserRole;
pub use user::{NewUser, ProfileUpdate, User, UserId, UserPatch, UserProfile};
pub use value_objects::{Email, EmailError, Username, UsernameError};
