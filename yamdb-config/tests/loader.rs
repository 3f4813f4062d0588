use std::collections::HashMap;
use std::fs;
use std::time::Duration;

use tempfile::TempDir;
use yamdb_config::{
    ConfigGuardRailError, ConfigLoadError, ConfigLoader, EnvConfig,
};

const STRONG_KEY: &str = "0123456789abcdef0123456789abcdef-strong";

fn env(pairs: &[(&str, &str)]) -> EnvConfig {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    EnvConfig::from_lookup(|name| map.get(name).cloned())
}

fn write_config(dir: &TempDir, body: &str) -> std::path::PathBuf {
    let path = dir.path().join("yamdb.toml");
    fs::write(&path, body).expect("write config");
    path
}

#[test]
fn file_values_are_overridden_by_env() {
    let dir = TempDir::new().unwrap();
    let path = write_config(
        &dir,
        r#"
dev_mode = false

[server]
host = "127.0.0.1"
port = 9000

[auth]
token_key = "0123456789abcdef0123456789abcdef-from-file"
access_token_ttl = "2h"

[mail]
from_email = "robot@yamdb.test"
smtp_host = "smtp.yamdb.test"
"#,
    );

    let load = ConfigLoader::new()
        .with_config_path(&path)
        .load_from(env(&[("SERVER_PORT", "9100"), ("AUTH_TOKEN_KEY", STRONG_KEY)]))
        .unwrap();
    let config = load.config;

    assert_eq!(config.server.bind_address(), "127.0.0.1:9100");
    assert_eq!(config.auth.token_key, STRONG_KEY);
    assert_eq!(config.auth.access_token_ttl, Duration::from_secs(2 * 3600));
    assert_eq!(
        config.auth.refresh_token_ttl,
        Duration::from_secs(30 * 24 * 3600)
    );
    assert_eq!(config.mail.from_email, "robot@yamdb.test");
    let smtp = config.mail.smtp.expect("smtp configured");
    assert_eq!(smtp.port, 587);
    assert_eq!(config.metadata.config_path.as_deref(), Some(path.as_path()));
    assert!(config.database.url.is_none());
}

#[test]
fn missing_token_key_is_fatal_outside_dev_mode() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "");

    let err = ConfigLoader::new()
        .with_config_path(&path)
        .load_from(env(&[]))
        .unwrap_err();
    assert!(matches!(
        err,
        ConfigLoadError::GuardRail(ConfigGuardRailError::MissingTokenKey)
    ));
}

#[test]
fn dev_mode_falls_back_to_development_key_with_warnings() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "dev_mode = true\n");

    let load = ConfigLoader::new()
        .with_config_path(&path)
        .load_from(env(&[("CORS_ALLOWED_ORIGINS", "*")]))
        .unwrap();

    assert!(load.config.auth.is_dev_token_key());
    let messages: Vec<&str> =
        load.warnings.iter().map(|w| w.message.as_str()).collect();
    assert!(messages.iter().any(|m| m.contains("development key")));
    assert!(messages.iter().any(|m| m.contains("any origin")));
    assert!(messages.iter().any(|m| m.contains("DATABASE_URL")));
}

#[test]
fn weak_keys_and_wildcard_cors_are_refused_in_production() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "");

    let err = ConfigLoader::new()
        .with_config_path(&path)
        .load_from(env(&[("AUTH_TOKEN_KEY", "short")]))
        .unwrap_err();
    assert!(matches!(
        err,
        ConfigLoadError::GuardRail(ConfigGuardRailError::WeakSecret { .. })
    ));

    let err = ConfigLoader::new()
        .with_config_path(&path)
        .load_from(env(&[
            ("AUTH_TOKEN_KEY", STRONG_KEY),
            ("CORS_ALLOWED_ORIGINS", "https://yamdb.test,*"),
        ]))
        .unwrap_err();
    assert!(matches!(
        err,
        ConfigLoadError::GuardRail(ConfigGuardRailError::DangerousCorsWildcard)
    ));
}

#[test]
fn explicit_missing_file_is_an_error() {
    let dir = TempDir::new().unwrap();
    let err = ConfigLoader::new()
        .with_config_path(dir.path().join("absent.toml"))
        .load_from(env(&[("AUTH_TOKEN_KEY", STRONG_KEY)]))
        .unwrap_err();
    assert!(matches!(err, ConfigLoadError::MissingConfig { .. }));
}

#[test]
fn bad_inputs_are_reported() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "[server\nport = 1");
    let err = ConfigLoader::new()
        .with_config_path(&path)
        .load_from(env(&[]))
        .unwrap_err();
    assert!(matches!(err, ConfigLoadError::Parse { .. }));

    let path = write_config(&dir, "");
    let err = ConfigLoader::new()
        .with_config_path(&path)
        .load_from(env(&[
            ("AUTH_TOKEN_KEY", STRONG_KEY),
            ("AUTH_ACCESS_TOKEN_TTL", "forever"),
        ]))
        .unwrap_err();
    assert!(matches!(
        err,
        ConfigLoadError::InvalidDuration {
            field: "AUTH_ACCESS_TOKEN_TTL",
            ..
        }
    ));
}

#[test]
fn config_path_can_come_from_env() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "[database]\nmax_connections = 3\n");

    let load = ConfigLoader::new()
        .load_from(env(&[
            ("YAMDB_CONFIG", path.to_str().unwrap()),
            ("AUTH_TOKEN_KEY", STRONG_KEY),
            ("DATABASE_URL", "postgres://yamdb@localhost/yamdb"),
        ]))
        .unwrap();
    assert_eq!(load.config.database.max_connections, 3);
    assert_eq!(
        load.config.database.url.as_deref(),
        Some("postgres://yamdb@localhost/yamdb")
    );
}
