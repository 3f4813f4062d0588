use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use tracing::info;

use crate::database::infrastructure::postgres::{
    map_write_error, substring_pattern,
};
use crate::database::ports::users::UsersRepository;
use crate::domain::users::{NewUser, User, UserId, UserPatch, UserRole};
use crate::error::{DomainError, Result};

const USER_CONFLICTS: &[(&str, &str)] = &[
    ("users_username_key", "username already exists"),
    ("users_email_key", "email already registered"),
];

macro_rules! user_columns {
    () => {
        "id, username, email, first_name, last_name, bio, role, \
         is_staff, is_superuser, confirmation_code, date_joined"
    };
}

#[derive(Debug, FromRow)]
struct UserRow {
    id: i64,
    username: String,
    email: String,
    first_name: String,
    last_name: String,
    bio: Option<String>,
    role: String,
    is_staff: bool,
    is_superuser: bool,
    confirmation_code: String,
    date_joined: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = DomainError;

    fn try_from(row: UserRow) -> Result<Self> {
        let role: UserRole = row.role.parse().map_err(|_| {
            DomainError::Internal(format!(
                "user {} has unknown role '{}'",
                row.id, row.role
            ))
        })?;

        Ok(User {
            id: row.id,
            username: row.username,
            email: row.email,
            first_name: row.first_name,
            last_name: row.last_name,
            bio: row.bio,
            role,
            is_staff: row.is_staff,
            is_superuser: row.is_superuser,
            confirmation_code: row.confirmation_code,
            date_joined: row.date_joined,
        })
    }
}

/// PostgreSQL-backed implementation of the `UsersRepository` port.
#[derive(Clone, Debug)]
pub struct PostgresUsersRepository {
    pool: PgPool,
}

impl PostgresUsersRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl UsersRepository for PostgresUsersRepository {
    async fn create_user(&self, user: &NewUser) -> Result<User> {
        let row = sqlx::query_as::<_, UserRow>(concat!(
            "INSERT INTO users (username, email, first_name, last_name, bio, \
             role, confirmation_code) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING ",
            user_columns!()
        ))
        .bind(user.username.as_str())
        .bind(user.email.as_str())
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(user.bio.as_deref())
        .bind(user.role.as_str())
        .bind(&user.confirmation_code)
        .fetch_one(self.pool())
        .await
        .map_err(|e| map_write_error(e, USER_CONFLICTS))?;

        info!("Created user: {} ({})", row.username, row.id);
        row.try_into()
    }

    async fn get_user_by_id(&self, id: UserId) -> Result<Option<User>> {
        sqlx::query_as::<_, UserRow>(concat!(
            "SELECT ",
            user_columns!(),
            " FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool())
        .await?
        .map(User::try_from)
        .transpose()
    }

    async fn get_user_by_username(
        &self,
        username: &str,
    ) -> Result<Option<User>> {
        sqlx::query_as::<_, UserRow>(concat!(
            "SELECT ",
            user_columns!(),
            " FROM users WHERE username = $1"
        ))
        .bind(username)
        .fetch_optional(self.pool())
        .await?
        .map(User::try_from)
        .transpose()
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        sqlx::query_as::<_, UserRow>(concat!(
            "SELECT ",
            user_columns!(),
            " FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(self.pool())
        .await?
        .map(User::try_from)
        .transpose()
    }

    async fn list_users(&self, search: Option<&str>) -> Result<Vec<User>> {
        let rows = sqlx::query_as::<_, UserRow>(concat!(
            "SELECT ",
            user_columns!(),
            " FROM users \
             WHERE ($1::text IS NULL OR username ILIKE $1 ESCAPE '\\') \
             ORDER BY username"
        ))
        .bind(search.map(substring_pattern))
        .fetch_all(self.pool())
        .await?;

        rows.into_iter().map(User::try_from).collect()
    }

    async fn update_user(&self, id: UserId, patch: &UserPatch) -> Result<User> {
        let row = sqlx::query_as::<_, UserRow>(concat!(
            "UPDATE users SET \
                username   = COALESCE($2, username), \
                email      = COALESCE($3, email), \
                first_name = COALESCE($4, first_name), \
                last_name  = COALESCE($5, last_name), \
                bio        = COALESCE($6, bio), \
                role       = COALESCE($7, role) \
             WHERE id = $1 RETURNING ",
            user_columns!()
        ))
        .bind(id)
        .bind(patch.username.as_ref().map(|u| u.as_str()))
        .bind(patch.email.as_ref().map(|e| e.as_str()))
        .bind(patch.first_name.as_deref())
        .bind(patch.last_name.as_deref())
        .bind(patch.bio.as_deref())
        .bind(patch.role.map(|r| r.as_str()))
        .fetch_optional(self.pool())
        .await
        .map_err(|e| map_write_error(e, USER_CONFLICTS))?
        .ok_or_else(|| DomainError::not_found(format!("user {id}")))?;

        row.try_into()
    }

    async fn set_confirmation_code(&self, id: UserId, code: &str) -> Result<()> {
        let result =
            sqlx::query("UPDATE users SET confirmation_code = $2 WHERE id = $1")
                .bind(id)
                .bind(code)
                .execute(self.pool())
                .await?;

        if result.rows_affected() == 0 {
            return Err(DomainError::not_found(format!("user {id}")));
        }
        Ok(())
    }

    async fn delete_user(&self, id: UserId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
