//! Authorization policies.
//!
//! Every policy is a pure predicate over the acting user (or its absence),
//! the access class of the operation and, for object-level checks, the
//! author of the target. Nothing here touches storage.
//!
//! ```
//! use yamdb_core::domain::policy::{Access, Policy};
//!
//! // Anonymous readers may browse the catalog...
//! assert!(Policy::AdminOrReadOnly.has_permission(None, Access::Safe));
//! // ...but never change it.
//! assert!(!Policy::AdminOrReadOnly.has_permission(None, Access::Unsafe));
//! ```

use crate::domain::users::{User, UserId};
use crate::error::{DomainError, Result};

const NOT_AUTHENTICATED: &str = "authentication credentials were not provided";
const NOT_PERMITTED: &str = "you do not have permission to perform this action";

/// Access class of an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// Read-only: list, retrieve
    Safe,
    /// Mutating: create, update, delete
    Unsafe,
}

impl Access {
    /// Classify an HTTP method name; GET, HEAD and OPTIONS are safe.
    pub fn from_method(method: &str) -> Self {
        match method.to_ascii_uppercase().as_str() {
            "GET" | "HEAD" | "OPTIONS" => Access::Safe,
            _ => Access::Unsafe,
        }
    }

    pub fn is_safe(self) -> bool {
        matches!(self, Access::Safe)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Policy {
    /// Administrators and superusers only, whatever the access class
    AdminOnly,
    /// Reads for everyone; writes for the author, administrators and
    /// moderators
    OwnerOrStaffOrReadOnly,
    /// Reads for everyone; writes for administrators and superusers
    AdminOrReadOnly,
}

fn is_admin_or_superuser(user: &User) -> bool {
    user.is_admin() || user.is_superuser()
}

impl Policy {
    /// Request-level check, evaluated before any object is loaded.
    pub fn has_permission(self, actor: Option<&User>, access: Access) -> bool {
        match self {
            Policy::AdminOnly => actor.is_some_and(is_admin_or_superuser),
            Policy::OwnerOrStaffOrReadOnly => {
                access.is_safe() || actor.is_some()
            }
            Policy::AdminOrReadOnly => {
                access.is_safe() || actor.is_some_and(is_admin_or_superuser)
            }
        }
    }

    /// Object-level check against the author of the target.
    ///
    /// Always implies [`Policy::has_permission`].
    pub fn has_object_permission(
        self,
        actor: Option<&User>,
        access: Access,
        owner: UserId,
    ) -> bool {
        if !self.has_permission(actor, access) {
            return false;
        }

        match self {
            Policy::OwnerOrStaffOrReadOnly => {
                if access.is_safe() {
                    return true;
                }
                actor.is_some_and(|user| {
                    user.id == owner || user.is_admin() || user.is_moderator()
                })
            }
            Policy::AdminOnly | Policy::AdminOrReadOnly => true,
        }
    }

    /// Request-level check returning the matching domain error.
    pub fn authorize(self, actor: Option<&User>, access: Access) -> Result<()> {
        if self.has_permission(actor, access) {
            return Ok(());
        }
        Err(denial(actor))
    }

    /// Object-level check returning the matching domain error.
    pub fn authorize_object(
        self,
        actor: Option<&User>,
        access: Access,
        owner: UserId,
    ) -> Result<()> {
        if self.has_object_permission(actor, access, owner) {
            return Ok(());
        }
        Err(denial(actor))
    }
}

fn denial(actor: Option<&User>) -> DomainError {
    match actor {
        None => DomainError::Unauthenticated(NOT_AUTHENTICATED.into()),
        Some(_) => DomainError::Forbidden(NOT_PERMITTED.into()),
    }
}

/// Unwrap the actor for operations that require one, such as creating a
/// review or editing one's own profile.
pub fn require_actor(actor: Option<&User>) -> Result<&User> {
    actor.ok_or_else(|| DomainError::Unauthenticated(NOT_AUTHENTICATED.into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::users::UserRole;
    use crate::domain::users::user::fixtures::user_with_role;

    #[test]
    fn method_classification() {
        assert_eq!(Access::from_method("GET"), Access::Safe);
        assert_eq!(Access::from_method("head"), Access::Safe);
        assert_eq!(Access::from_method("OPTIONS"), Access::Safe);
        assert_eq!(Access::from_method("POST"), Access::Unsafe);
        assert_eq!(Access::from_method("PATCH"), Access::Unsafe);
        assert_eq!(Access::from_method("DELETE"), Access::Unsafe);
    }

    #[test]
    fn admin_only_denies_anonymous_and_plain_users() {
        let user = user_with_role(1, UserRole::User);
        let moderator = user_with_role(2, UserRole::Moderator);

        for access in [Access::Safe, Access::Unsafe] {
            assert!(!Policy::AdminOnly.has_permission(None, access));
            assert!(!Policy::AdminOnly.has_permission(Some(&user), access));
            assert!(
                !Policy::AdminOnly.has_permission(Some(&moderator), access)
            );
        }
    }

    #[test]
    fn admin_only_allows_admins_superusers_and_staff() {
        let admin = user_with_role(1, UserRole::Admin);
        let superuser = user_with_role(2, UserRole::Superuser);
        let mut staff = user_with_role(3, UserRole::User);
        staff.is_staff = true;
        let mut flagged = user_with_role(4, UserRole::User);
        flagged.is_superuser = true;

        for actor in [&admin, &superuser, &staff, &flagged] {
            assert!(Policy::AdminOnly.has_permission(Some(actor), Access::Unsafe));
        }
    }

    #[test]
    fn admin_or_read_only() {
        let user = user_with_role(1, UserRole::User);
        let admin = user_with_role(2, UserRole::Admin);

        assert!(Policy::AdminOrReadOnly.has_permission(None, Access::Safe));
        assert!(Policy::AdminOrReadOnly.has_permission(Some(&user), Access::Safe));
        assert!(!Policy::AdminOrReadOnly.has_permission(None, Access::Unsafe));
        assert!(
            !Policy::AdminOrReadOnly.has_permission(Some(&user), Access::Unsafe)
        );
        assert!(
            Policy::AdminOrReadOnly.has_permission(Some(&admin), Access::Unsafe)
        );
    }

    #[test]
    fn owner_or_staff_object_rules() {
        let author = user_with_role(1, UserRole::User);
        let other = user_with_role(2, UserRole::User);
        let moderator = user_with_role(3, UserRole::Moderator);
        let admin = user_with_role(4, UserRole::Admin);
        let policy = Policy::OwnerOrStaffOrReadOnly;

        // Reads are open to everyone, including anonymous actors.
        assert!(policy.has_object_permission(None, Access::Safe, author.id));
        assert!(policy.has_object_permission(
            Some(&other),
            Access::Safe,
            author.id
        ));

        assert!(!policy.has_object_permission(None, Access::Unsafe, author.id));
        assert!(policy.has_object_permission(
            Some(&author),
            Access::Unsafe,
            author.id
        ));
        assert!(!policy.has_object_permission(
            Some(&other),
            Access::Unsafe,
            author.id
        ));
        assert!(policy.has_object_permission(
            Some(&moderator),
            Access::Unsafe,
            author.id
        ));
        assert!(policy.has_object_permission(
            Some(&admin),
            Access::Unsafe,
            author.id
        ));
    }

    #[test]
    fn owner_or_staff_request_level_requires_login_for_writes() {
        let user = user_with_role(1, UserRole::User);
        let policy = Policy::OwnerOrStaffOrReadOnly;
        assert!(policy.has_permission(None, Access::Safe));
        assert!(!policy.has_permission(None, Access::Unsafe));
        assert!(policy.has_permission(Some(&user), Access::Unsafe));
    }

    #[test]
    fn denials_distinguish_anonymous_from_forbidden() {
        let user = user_with_role(1, UserRole::User);

        assert!(matches!(
            Policy::AdminOnly.authorize(None, Access::Unsafe),
            Err(DomainError::Unauthenticated(_))
        ));
        assert!(matches!(
            Policy::AdminOnly.authorize(Some(&user), Access::Unsafe),
            Err(DomainError::Forbidden(_))
        ));
        assert!(matches!(
            Policy::OwnerOrStaffOrReadOnly.authorize_object(
                Some(&user),
                Access::Unsafe,
                99
            ),
            Err(DomainError::Forbidden(_))
        ));
    }
}
