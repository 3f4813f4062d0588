use thiserror::Error;

use crate::constants::MIN_TOKEN_KEY_LEN;
use crate::models::{AuthConfig, Config};

#[derive(Debug, Error)]
pub enum ConfigGuardRailError {
    #[error("AUTH_TOKEN_KEY must be set when DEV_MODE is false")]
    MissingTokenKey,
    #[error("authentication secret {field} {reason}")]
    WeakSecret { field: &'static str, reason: String },
    #[error("CORS wildcard origins are not allowed when DEV_MODE is false")]
    DangerousCorsWildcard,
}

#[derive(Debug, Clone)]
pub struct ConfigWarning {
    pub message: String,
    pub hint: Option<String>,
}

#[derive(Debug, Default, Clone)]
pub struct ConfigWarnings {
    pub items: Vec<ConfigWarning>,
}

impl ConfigWarnings {
    pub fn push<S: Into<String>>(&mut self, message: S) {
        self.items.push(ConfigWarning {
            message: message.into(),
            hint: None,
        });
    }

    pub fn push_with_hint<S: Into<String>, H: Into<String>>(
        &mut self,
        message: S,
        hint: H,
    ) {
        self.items.push(ConfigWarning {
            message: message.into(),
            hint: Some(hint.into()),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ConfigWarning> {
        self.items.iter()
    }

    pub fn extend(&mut self, other: ConfigWarnings) {
        self.items.extend(other.items);
    }
}

pub fn apply_guard_rails(
    config: &Config,
) -> Result<ConfigWarnings, ConfigGuardRailError> {
    let mut warnings = ConfigWarnings::default();

    if config.dev_mode {
        if config.auth.is_dev_token_key() {
            warnings.push_with_hint(
                "Signing tokens with the built-in development key",
                "Set AUTH_TOKEN_KEY before exposing this server",
            );
        } else if config.auth.token_key.len() < MIN_TOKEN_KEY_LEN {
            warnings.push(format!(
                "AUTH_TOKEN_KEY is shorter than {MIN_TOKEN_KEY_LEN} characters"
            ));
        }
        if config.cors.is_wildcard_included() {
            warnings.push("CORS allows any origin");
        }
    } else {
        enforce_secret(&config.auth)?;
        if config.cors.is_wildcard_included() {
            return Err(ConfigGuardRailError::DangerousCorsWildcard);
        }
    }

    if config.database.url.is_none() {
        warnings.push_with_hint(
            "DATABASE_URL not configured; data is kept in memory and lost on restart",
            "Point DATABASE_URL at a PostgreSQL database for persistent storage",
        );
    }

    if config.mail.smtp.is_none() {
        warnings.push_with_hint(
            "SMTP_HOST not configured; confirmation codes are written to the log",
            "Set SMTP_HOST (and SMTP_USERNAME/SMTP_PASSWORD) to deliver mail",
        );
    }

    Ok(warnings)
}

fn enforce_secret(auth: &AuthConfig) -> Result<(), ConfigGuardRailError> {
    if auth.is_dev_token_key() {
        return Err(ConfigGuardRailError::WeakSecret {
            field: "AUTH_TOKEN_KEY",
            reason: "uses the development placeholder value".into(),
        });
    }

    if auth.token_key.len() < MIN_TOKEN_KEY_LEN {
        return Err(ConfigGuardRailError::WeakSecret {
            field: "AUTH_TOKEN_KEY",
            reason: format!("must be at least {MIN_TOKEN_KEY_LEN} characters"),
        });
    }

    Ok(())
}
