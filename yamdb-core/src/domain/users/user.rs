//! User identity records.
//!
//! A user is created unconfirmed by the sign-up flow (or directly by an
//! administrator) and carries a one-time confirmation code that stands in
//! for a password when a token pair is requested.
//!
//! Authority is never stored as independent booleans beyond the two
//! account flags inherited from the admin tooling (`is_staff`,
//! `is_superuser`); [`User::is_admin`], [`User::is_moderator`] and
//! [`User::is_superuser`] derive it from the role on every call.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::role::UserRole;
use super::value_objects::{Email, Username};

pub type UserId = i64;

/// Stored user record.
///
/// The confirmation code is never serialized.
#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub bio: Option<String>,
    pub role: UserRole,
    /// Staff accounts are treated as administrators
    pub is_staff: bool,
    pub is_superuser: bool,
    #[serde(skip_serializing)]
    pub confirmation_code: String,
    pub date_joined: DateTime<Utc>,
}

impl User {
    /// Administrator by role or by staff flag
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin || self.is_staff
    }

    pub fn is_moderator(&self) -> bool {
        self.role == UserRole::Moderator
    }

    /// Superuser by role or by account flag
    pub fn is_superuser(&self) -> bool {
        self.role == UserRole::Superuser || self.is_superuser
    }

    /// Public representation used by both the admin and the self-service views
    pub fn profile(&self) -> UserProfile {
        UserProfile {
            username: self.username.clone(),
            email: self.email.clone(),
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            bio: self.bio.clone(),
            role: self.role,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub bio: Option<String>,
    pub role: UserRole,
}

/// Validated input for inserting a user.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: Username,
    pub email: Email,
    pub first_name: String,
    pub last_name: String,
    pub bio: Option<String>,
    pub role: UserRole,
    pub confirmation_code: String,
}

impl NewUser {
    /// Minimal record created by the sign-up flow
    pub fn signup(
        username: Username,
        email: Email,
        confirmation_code: String,
    ) -> Self {
        Self {
            username,
            email,
            first_name: String::new(),
            last_name: String::new(),
            bio: None,
            role: UserRole::User,
            confirmation_code,
        }
    }
}

/// Administrator-side partial update. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserPatch {
    pub username: Option<Username>,
    pub email: Option<Email>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub bio: Option<String>,
    pub role: Option<UserRole>,
}

/// Self-service update.
///
/// Only these fields exist on the self-service path, so identity and role
/// fields sent by a client have nowhere to land.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileUpdate {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub bio: Option<String>,
}

impl ProfileUpdate {
    pub fn into_patch(self) -> UserPatch {
        UserPatch {
            first_name: self.first_name,
            last_name: self.last_name,
            bio: self.bio,
            ..UserPatch::default()
        }
    }
}
