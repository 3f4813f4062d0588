use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;

static USERNAME_CHARS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[\w.@+-]+$").expect("username pattern compiles")
});

/// Path segment used for the self-service profile; never a valid username.
pub const RESERVED_USERNAME: &str = "me";

const USERNAME_MIN_LEN: usize = 3;
const USERNAME_MAX_LEN: usize = 150;
const EMAIL_MAX_LEN: usize = 254;

/// Username value object with validation
///
/// Represents a validated username that follows the business rules:
/// - 3-150 characters in length
/// - Letters, digits and `@ . + - _` only
/// - Never the reserved literal `me`
///
/// Unlike display-oriented identifiers the username keeps its case.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Username(String);

impl Username {
    /// Create a new username with validation
    pub fn new(username: impl AsRef<str>) -> Result<Self, UsernameError> {
        let username = username.as_ref().trim();

        if username == RESERVED_USERNAME {
            return Err(UsernameError::Reserved);
        }

        let length = username.chars().count();
        if length < USERNAME_MIN_LEN {
            return Err(UsernameError::TooShort);
        }

        if length > USERNAME_MAX_LEN {
            return Err(UsernameError::TooLong);
        }

        if !USERNAME_CHARS.is_match(username) {
            return Err(UsernameError::InvalidCharacters);
        }

        Ok(Self(username.to_string()))
    }

    /// Get the username as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Get the username as a String
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for Username {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Username {
    type Error = UsernameError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Username> for String {
    fn from(value: Username) -> Self {
        value.0
    }
}

/// Errors that can occur when creating a username
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UsernameError {
    #[error("Username \"me\" is reserved")]
    Reserved,

    #[error("Username too short: minimum 3 characters required")]
    TooShort,

    #[error("Username too long: maximum 150 characters allowed")]
    TooLong,

    #[error(
        "Username contains invalid characters: only letters, digits and @/./+/-/_ allowed"
    )]
    InvalidCharacters,
}

/// Email address value object
///
/// Only the structural checks needed to route a confirmation code are
/// applied: a single `@`, a non-empty local part and a dotted domain.
/// Addresses are stored as given, except for surrounding whitespace.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Email(String);

impl Email {
    pub fn new(email: impl AsRef<str>) -> Result<Self, EmailError> {
        let email = email.as_ref().trim();

        if email.is_empty() {
            return Err(EmailError::Empty);
        }

        if email.len() > EMAIL_MAX_LEN {
            return Err(EmailError::TooLong);
        }

        let Some((local, domain)) = email.split_once('@') else {
            return Err(EmailError::InvalidFormat);
        };

        let domain_ok = !domain.is_empty()
            && !domain.contains('@')
            && domain.contains('.')
            && !domain.starts_with('.')
            && !domain.ends_with('.');

        if local.is_empty()
            || !domain_ok
            || email.chars().any(char::is_whitespace)
        {
            return Err(EmailError::InvalidFormat);
        }

        Ok(Self(email.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for Email {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Email {
    type Error = EmailError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Email> for String {
    fn from(value: Email) -> Self {
        value.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EmailError {
    #[error("Email is required")]
    Empty,

    #[error("Email too long: maximum 254 characters allowed")]
    TooLong,

    #[error("Enter a valid email address")]
    InvalidFormat,
}
