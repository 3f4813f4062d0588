use serde::{Deserialize, Serialize};

/// User role enumeration for role-based access control
///
/// The role is the only stored authority marker. Whether a user counts as
/// an administrator or moderator is always derived from it (together with
/// the staff/superuser flags on [`super::User`]).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    /// Regular user
    /// - Can read the catalog
    /// - Can write reviews and comments
    /// - Can edit and delete own reviews and comments
    #[default]
    User,

    /// Moderator
    /// - All User permissions
    /// - Can edit and delete anyone's reviews and comments
    Moderator,

    /// Administrator
    /// - All Moderator permissions
    /// - Can manage the catalog
    /// - Can manage users and roles
    Admin,

    /// Superuser, same authority as Admin over the catalog and users
    Superuser,
}

impl UserRole {
    /// Get all available roles
    pub fn all() -> &'static [UserRole] {
        &[
            UserRole::User,
            UserRole::Moderator,
            UserRole::Admin,
            UserRole::Superuser,
        ]
    }

    /// Get the role name as stored and serialized
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::User => "user",
            UserRole::Moderator => "moderator",
            UserRole::Admin => "admin",
            UserRole::Superuser => "superuser",
        }
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "user" => Ok(UserRole::User),
            "moderator" => Ok(UserRole::Moderator),
            "admin" | "administrator" => Ok(UserRole::Admin),
            "superuser" => Ok(UserRole::Superuser),
            _ => Err(format!("Invalid user role: {}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_conversion() {
        for role in UserRole::all() {
            assert_eq!(role.as_str().parse::<UserRole>().unwrap(), *role);
        }
        assert_eq!(
            "Administrator".parse::<UserRole>().unwrap(),
            UserRole::Admin
        );
        assert!("owner".parse::<UserRole>().is_err());
    }

    #[test]
    fn serializes_lowercase() {
        let json = serde_json::to_string(&UserRole::Moderator).unwrap();
        assert_eq!(json, "\"moderator\"");

        let role: UserRole = serde_json::from_str("\"superuser\"").unwrap();
        assert_eq!(role, UserRole::Superuser);
    }

    #[test]
    fn defaults_to_user() {
        assert_eq!(UserRole::default(), UserRole::User);
    }
}
