use thiserror::Error;

use crate::domain::users::{EmailError, UsernameError};

#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Permission denied: {0}")]
    Forbidden(String),

    #[error("Authentication required: {0}")]
    Unauthenticated(String),

    #[error("Mail delivery failed: {0}")]
    Mail(String),

    #[error("Token error: {0}")]
    Token(String),

    #[error("Import failed: {0}")]
    Import(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl DomainError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict(message.into())
    }
}

impl From<UsernameError> for DomainError {
    fn from(err: UsernameError) -> Self {
        Self::Validation(err.to_string())
    }
}

impl From<EmailError> for DomainError {
    fn from(err: EmailError) -> Self {
        Self::Validation(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, DomainError>;
