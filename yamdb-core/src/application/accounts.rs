//! Sign-up, token issuance, self-service profiles and user administration.

use std::sync::Arc;

use constant_time_eq::constant_time_eq;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::application::unit_of_work::AppUnitOfWork;
use crate::database::ports::users::UsersRepository;
use crate::domain::mail::{Mailer, confirmation_code_mail};
use crate::domain::policy::{Access, Policy, require_actor};
use crate::domain::tokens::{TokenIssuer, TokenPair};
use crate::domain::users::{
    Email, NewUser, ProfileUpdate, User, UserPatch, UserProfile, UserRole,
    Username,
};
use crate::error::{DomainError, Result};

const PERSON_NAME_MAX_LEN: usize = 150;
const INVALID_CREDENTIALS: &str = "invalid credentials";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignupCommand {
    pub username: String,
    pub email: String,
}

/// Echo returned by a successful sign-up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SignupReceipt {
    pub username: String,
    pub email: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TokenRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub confirmation_code: String,
}

/// Administrator-side user creation, also used as the full replacement
/// payload.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateUserCommand {
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub role: UserRole,
}

impl CreateUserCommand {
    fn into_patch(self) -> Result<UserPatch> {
        Ok(UserPatch {
            username: Some(Username::new(&self.username)?),
            email: Some(Email::new(&self.email)?),
            first_name: Some(self.first_name),
            last_name: Some(self.last_name),
            bio: self.bio,
            role: Some(self.role),
        })
    }
}

pub(crate) fn generate_confirmation_code() -> String {
    Uuid::new_v4().to_string()
}

fn validate_patch(patch: &UserPatch) -> Result<()> {
    for (field, value) in [
        ("first_name", &patch.first_name),
        ("last_name", &patch.last_name),
    ] {
        if value
            .as_ref()
            .is_some_and(|v| v.chars().count() > PERSON_NAME_MAX_LEN)
        {
            return Err(DomainError::validation(format!(
                "{field} too long: maximum {PERSON_NAME_MAX_LEN} characters allowed"
            )));
        }
    }
    Ok(())
}

#[derive(Clone)]
pub struct AccountService {
    users: Arc<dyn UsersRepository>,
    mailer: Arc<dyn Mailer>,
    tokens: Arc<dyn TokenIssuer>,
    sender: String,
}

impl std::fmt::Debug for AccountService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccountService")
            .field("users_repo", &Arc::strong_count(&self.users))
            .field("mailer", &Arc::strong_count(&self.mailer))
            .field("tokens", &Arc::strong_count(&self.tokens))
            .field("sender", &self.sender)
            .finish()
    }
}

impl AccountService {
    pub fn new(
        uow: &AppUnitOfWork,
        mailer: Arc<dyn Mailer>,
        tokens: Arc<dyn TokenIssuer>,
        sender: impl Into<String>,
    ) -> Self {
        Self {
            users: uow.users.clone(),
            mailer,
            tokens,
            sender: sender.into(),
        }
    }

    /// Register a user, or regenerate the code of an identical pending
    /// registration, and mail the confirmation code.
    pub async fn signup(&self, command: SignupCommand) -> Result<SignupReceipt> {
        let username = Username::new(&command.username)?;
        let email = Email::new(&command.email)?;
        let code = generate_confirmation_code();

        let existing =
            self.users.get_user_by_username(username.as_str()).await?;
        let user = match existing {
            Some(existing) if existing.email == email.as_str() => {
                self.users
                    .set_confirmation_code(existing.id, &code)
                    .await?;
                info!("Regenerated confirmation code for {}", existing.username);
                existing
            }
            Some(_) => {
                return Err(DomainError::conflict(
                    "username is already registered with a different email",
                ));
            }
            None => {
                if self.users.get_user_by_email(email.as_str()).await?.is_some() {
                    return Err(DomainError::conflict("email already registered"));
                }
                self.users
                    .create_user(&NewUser::signup(username, email, code.clone()))
                    .await?
            }
        };

        self.deliver_code(&user.email, &code).await;

        Ok(SignupReceipt {
            username: user.username,
            email: user.email,
        })
    }

    async fn deliver_code(&self, recipient: &str, code: &str) {
        let mail = confirmation_code_mail(&self.sender, recipient, code);
        if let Err(err) = self.mailer.send(mail).await {
            warn!(recipient, "failed to deliver confirmation code: {err}");
        }
    }

    /// Exchange a username and its confirmation code for a token pair.
    pub async fn obtain_token(&self, request: TokenRequest) -> Result<TokenPair> {
        if request.username.trim().is_empty() {
            return Err(DomainError::validation("username is required"));
        }
        if request.confirmation_code.is_empty() {
            return Err(DomainError::validation("confirmation_code is required"));
        }

        let user = self
            .users
            .get_user_by_username(request.username.trim())
            .await?
            .ok_or_else(|| DomainError::not_found("user not found"))?;

        if !constant_time_eq(
            request.confirmation_code.as_bytes(),
            user.confirmation_code.as_bytes(),
        ) {
            return Err(DomainError::validation(INVALID_CREDENTIALS));
        }

        self.tokens.issue(&user)
    }

    pub fn own_profile(&self, actor: Option<&User>) -> Result<UserProfile> {
        Ok(require_actor(actor)?.profile())
    }

    pub async fn update_own_profile(
        &self,
        actor: Option<&User>,
        update: ProfileUpdate,
    ) -> Result<UserProfile> {
        let actor = require_actor(actor)?;
        let patch = update.into_patch();
        validate_patch(&patch)?;

        let user = self.users.update_user(actor.id, &patch).await?;
        Ok(user.profile())
    }

    pub async fn list_users(
        &self,
        actor: Option<&User>,
        search: Option<&str>,
    ) -> Result<Vec<UserProfile>> {
        Policy::AdminOnly.authorize(actor, Access::Safe)?;
        let search = search.map(str::trim).filter(|s| !s.is_empty());

        let users = self.users.list_users(search).await?;
        Ok(users.iter().map(User::profile).collect())
    }

    pub async fn create_user(
        &self,
        actor: Option<&User>,
        command: CreateUserCommand,
    ) -> Result<UserProfile> {
        Policy::AdminOnly.authorize(actor, Access::Unsafe)?;

        let new_user = NewUser {
            username: Username::new(&command.username)?,
            email: Email::new(&command.email)?,
            first_name: command.first_name,
            last_name: command.last_name,
            bio: command.bio,
            role: command.role,
            confirmation_code: generate_confirmation_code(),
        };
        validate_patch(&UserPatch {
            first_name: Some(new_user.first_name.clone()),
            last_name: Some(new_user.last_name.clone()),
            ..UserPatch::default()
        })?;

        if self
            .users
            .get_user_by_username(new_user.username.as_str())
            .await?
            .is_some()
        {
            return Err(DomainError::conflict("username already exists"));
        }
        if self
            .users
            .get_user_by_email(new_user.email.as_str())
            .await?
            .is_some()
        {
            return Err(DomainError::conflict("email already registered"));
        }

        let user = self.users.create_user(&new_user).await?;
        Ok(user.profile())
    }

    async fn user_by_username(&self, username: &str) -> Result<User> {
        self.users
            .get_user_by_username(username)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("user {username}")))
    }

    pub async fn get_user(
        &self,
        actor: Option<&User>,
        username: &str,
    ) -> Result<UserProfile> {
        Policy::AdminOnly.authorize(actor, Access::Safe)?;
        Ok(self.user_by_username(username).await?.profile())
    }

    pub async fn update_user(
        &self,
        actor: Option<&User>,
        username: &str,
        patch: UserPatch,
    ) -> Result<UserProfile> {
        Policy::AdminOnly.authorize(actor, Access::Unsafe)?;
        validate_patch(&patch)?;

        let target = self.user_by_username(username).await?;
        let user = self.users.update_user(target.id, &patch).await?;
        info!("Updated user {} (role {})", user.username, user.role);
        Ok(user.profile())
    }

    pub async fn replace_user(
        &self,
        actor: Option<&User>,
        username: &str,
        command: CreateUserCommand,
    ) -> Result<UserProfile> {
        Policy::AdminOnly.authorize(actor, Access::Unsafe)?;
        let patch = command.into_patch()?;
        self.update_user(actor, username, patch).await
    }

    pub async fn delete_user(
        &self,
        actor: Option<&User>,
        username: &str,
    ) -> Result<()> {
        Policy::AdminOnly.authorize(actor, Access::Unsafe)?;

        let target = self.user_by_username(username).await?;
        if !self.users.delete_user(target.id).await? {
            return Err(DomainError::not_found(format!("user {username}")));
        }
        info!("Deleted user {}", target.username);
        Ok(())
    }
}
