use async_trait::async_trait;

use crate::domain::users::{NewUser, User, UserId, UserPatch};
use crate::error::Result;

// Identity store. Unique violations on username or email surface as
// `DomainError::Conflict`.
#[async_trait]
pub trait UsersRepository: Send + Sync {
    async fn create_user(&self, user: &NewUser) -> Result<User>;
    async fn get_user_by_id(&self, id: UserId) -> Result<Option<User>>;
    async fn get_user_by_username(&self, username: &str)
    -> Result<Option<User>>;
    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>>;
    /// Ordered by username; `search` is a case-insensitive substring
    async fn list_users(&self, search: Option<&str>) -> Result<Vec<User>>;
    async fn update_user(&self, id: UserId, patch: &UserPatch) -> Result<User>;
    async fn set_confirmation_code(&self, id: UserId, code: &str)
    -> Result<()>;
    /// Cascades to the user's reviews and comments
    async fn delete_user(&self, id: UserId) -> Result<bool>;
}
