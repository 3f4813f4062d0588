use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::util::{non_empty, parse_bool, parse_csv};

/// Raw configuration as defined in a TOML file.
#[derive(Debug, Default, Clone, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct FileConfig {
    #[serde(default)]
    pub server: FileServerConfig,
    #[serde(default)]
    pub database: FileDatabaseConfig,
    #[serde(default)]
    pub auth: FileAuthConfig,
    #[serde(default)]
    pub mail: FileMailConfig,
    #[serde(default)]
    pub cors: FileCorsConfig,
    pub dev_mode: Option<bool>,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct FileServerConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct FileDatabaseConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_connections: Option<u32>,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct FileAuthConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_key: Option<String>,
    /// humantime string such as `"1d"` or `"12h"`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_token_ttl: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token_ttl: Option<String>,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct FileMailConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from_email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub smtp_host: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub smtp_port: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub smtp_username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub smtp_password: Option<String>,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct FileCorsConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allowed_origins: Option<Vec<String>>,
}

/// Environment-derived configuration values.
#[derive(Debug, Default, Clone)]
pub struct EnvConfig {
    pub config_path: Option<PathBuf>,
    pub server_host: Option<String>,
    pub server_port: Option<u16>,
    pub database_url: Option<String>,
    pub database_host: Option<String>,
    pub database_port: Option<u16>,
    pub database_user: Option<String>,
    pub database_password: Option<String>,
    pub database_name: Option<String>,
    pub database_max_connections: Option<u32>,
    pub auth_token_key: Option<String>,
    pub auth_access_token_ttl: Option<String>,
    pub auth_refresh_token_ttl: Option<String>,
    pub mail_from_email: Option<String>,
    pub smtp_host: Option<String>,
    pub smtp_port: Option<u16>,
    pub smtp_username: Option<String>,
    pub smtp_password: Option<String>,
    pub cors_allowed_origins: Option<Vec<String>>,
    pub dev_mode: Option<bool>,
}

impl EnvConfig {
    /// Read the process environment.
    pub fn gather() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read values through `lookup`; blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| non_empty(lookup(name));
        let parsed = |name: &str| var(name).and_then(|s| s.trim().parse().ok());

        Self {
            config_path: var("YAMDB_CONFIG").map(PathBuf::from),
            server_host: var("SERVER_HOST"),
            server_port: parsed("SERVER_PORT").and_then(|v: u64| u16::try_from(v).ok()),
            database_url: var("DATABASE_URL"),
            database_host: var("DATABASE_HOST"),
            database_port: parsed("DATABASE_PORT").and_then(|v: u64| u16::try_from(v).ok()),
            database_user: var("DATABASE_USER"),
            database_password: var("DATABASE_PASSWORD"),
            database_name: var("DATABASE_NAME"),
            database_max_connections: parsed("DATABASE_MAX_CONNECTIONS")
                .and_then(|v: u64| u32::try_from(v).ok()),
            auth_token_key: var("AUTH_TOKEN_KEY"),
            auth_access_token_ttl: var("AUTH_ACCESS_TOKEN_TTL"),
            auth_refresh_token_ttl: var("AUTH_REFRESH_TOKEN_TTL"),
            mail_from_email: var("MAIL_FROM_EMAIL"),
            smtp_host: var("SMTP_HOST"),
            smtp_port: parsed("SMTP_PORT").and_then(|v: u64| u16::try_from(v).ok()),
            smtp_username: var("SMTP_USERNAME"),
            smtp_password: var("SMTP_PASSWORD"),
            cors_allowed_origins: var("CORS_ALLOWED_ORIGINS")
                .map(|raw| parse_csv(&raw)),
            dev_mode: var("DEV_MODE").and_then(|raw| parse_bool(&raw)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> EnvConfig {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        EnvConfig::from_lookup(|name| map.get(name).cloned())
    }

    #[test]
    fn parses_typed_values() {
        let env = env(&[
            ("SERVER_PORT", "9000"),
            ("DEV_MODE", "true"),
            ("CORS_ALLOWED_ORIGINS", "http://a.test,http://b.test"),
            ("SMTP_PORT", "not-a-port"),
        ]);
        assert_eq!(env.server_port, Some(9000));
        assert_eq!(env.dev_mode, Some(true));
        assert_eq!(env.cors_allowed_origins.map(|o| o.len()), Some(2));
        assert_eq!(env.smtp_port, None);
    }

    #[test]
    fn blank_values_are_unset() {
        let env = env(&[("DATABASE_URL", "   "), ("SERVER_PORT", "70000")]);
        assert!(env.database_url.is_none());
        assert!(env.server_port.is_none());
    }
}
