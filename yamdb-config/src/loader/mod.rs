pub mod db_url;
pub mod error;

use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::{
    constants::{
        DEFAULT_ACCESS_TOKEN_TTL, DEFAULT_FROM_EMAIL, DEFAULT_HOST,
        DEFAULT_MAX_CONNECTIONS, DEFAULT_PORT, DEFAULT_REFRESH_TOKEN_TTL,
        DEFAULT_SMTP_PORT, DEV_TOKEN_KEY,
    },
    models::{
        AuthConfig, Config, ConfigMetadata, CorsConfig, DatabaseConfig,
        MailConfig, ServerConfig, SmtpConfig,
        sources::{EnvConfig, FileConfig},
    },
    validation::{self, ConfigGuardRailError, ConfigWarnings},
};

pub use error::ConfigLoadError;

const DEFAULT_CONFIG_LOCATIONS: [&str; 2] = ["yamdb.toml", "config/yamdb.toml"];

#[derive(Debug, Default, Clone)]
pub struct ConfigLoaderOptions {
    pub config_path: Option<PathBuf>,
    pub env_file: Option<PathBuf>,
}

#[derive(Debug, Default)]
pub struct ConfigLoader {
    options: ConfigLoaderOptions,
}

#[derive(Debug)]
pub struct ConfigLoad {
    pub config: Config,
    pub warnings: ConfigWarnings,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: ConfigLoaderOptions) -> Self {
        Self { options }
    }

    pub fn with_config_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.options.config_path = Some(path.into());
        self
    }

    pub fn with_env_file<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.options.env_file = Some(path.into());
        self
    }

    /// Load `.env` (if any), read the process environment and compose the
    /// final configuration.
    pub fn load(&self) -> Result<ConfigLoad, ConfigLoadError> {
        let env_file_loaded = match &self.options.env_file {
            Some(path) => dotenvy::from_path(path).map(|_| true).or_else(
                |err| match err {
                    dotenvy::Error::Io(_) => Ok(false),
                    _ => Err(err),
                },
            )?,
            None => {
                dotenvy::dotenv().map(|_| true).or_else(|err| match err {
                    dotenvy::Error::Io(_) => Ok(false),
                    _ => Err(err),
                })?
            }
        };

        self.compose(EnvConfig::gather(), env_file_loaded)
    }

    /// Compose from an already gathered environment. Does not touch `.env`.
    pub fn load_from(
        &self,
        env: EnvConfig,
    ) -> Result<ConfigLoad, ConfigLoadError> {
        self.compose(env, false)
    }

    fn compose(
        &self,
        env: EnvConfig,
        env_file_loaded: bool,
    ) -> Result<ConfigLoad, ConfigLoadError> {
        let (file_config, config_path) = self.load_file_config(&env)?;

        let mut warnings = ConfigWarnings::default();
        if file_config.is_none() {
            warnings.push_with_hint(
                "No yamdb.toml detected; using environment variables and defaults",
                "Pass --config or set YAMDB_CONFIG to use a configuration file",
            );
        }

        let config = compose_config(
            file_config.unwrap_or_default(),
            env,
            ConfigMetadata {
                config_path,
                env_file_loaded,
            },
        )?;

        warnings.extend(validation::apply_guard_rails(&config)?);
        Ok(ConfigLoad { config, warnings })
    }

    fn load_file_config(
        &self,
        env: &EnvConfig,
    ) -> Result<(Option<FileConfig>, Option<PathBuf>), ConfigLoadError> {
        let explicit = self
            .options
            .config_path
            .clone()
            .or_else(|| env.config_path.clone());

        let path = match explicit {
            Some(path) if !path.exists() => {
                return Err(ConfigLoadError::MissingConfig { path });
            }
            Some(path) => path,
            None => match DEFAULT_CONFIG_LOCATIONS
                .iter()
                .map(PathBuf::from)
                .find(|candidate| candidate.exists())
            {
                Some(path) => path,
                None => return Ok((None, None)),
            },
        };

        let file_config = read_file_config(&path)?;
        Ok((Some(file_config), Some(path)))
    }
}

fn read_file_config(path: &Path) -> Result<FileConfig, ConfigLoadError> {
    let contents =
        fs::read_to_string(path).map_err(|source| ConfigLoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
    toml::from_str(&contents).map_err(|source| ConfigLoadError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Environment values override file values, which override defaults.
fn compose_config(
    file: FileConfig,
    env: EnvConfig,
    metadata: ConfigMetadata,
) -> Result<Config, ConfigLoadError> {
    let FileConfig {
        server: file_server,
        database: file_database,
        auth: file_auth,
        mail: file_mail,
        cors: file_cors,
        dev_mode: file_dev_mode,
    } = file;

    let dev_mode = env.dev_mode.or(file_dev_mode).unwrap_or(false);

    let server = ServerConfig {
        host: env
            .server_host
            .clone()
            .or(file_server.host)
            .unwrap_or_else(|| DEFAULT_HOST.to_string()),
        port: env.server_port.or(file_server.port).unwrap_or(DEFAULT_PORT),
    };

    let database = DatabaseConfig {
        url: db_url::resolve_database_url(&env, &file_database)?,
        max_connections: env
            .database_max_connections
            .or(file_database.max_connections)
            .unwrap_or(DEFAULT_MAX_CONNECTIONS),
    };

    let token_key = match env.auth_token_key.clone().or(file_auth.token_key) {
        Some(key) => key,
        None if dev_mode => DEV_TOKEN_KEY.to_string(),
        None => return Err(ConfigGuardRailError::MissingTokenKey.into()),
    };
    let auth = AuthConfig {
        token_key,
        access_token_ttl: parse_ttl(
            "AUTH_ACCESS_TOKEN_TTL",
            env.auth_access_token_ttl.clone().or(file_auth.access_token_ttl),
            DEFAULT_ACCESS_TOKEN_TTL,
        )?,
        refresh_token_ttl: parse_ttl(
            "AUTH_REFRESH_TOKEN_TTL",
            env.auth_refresh_token_ttl
                .clone()
                .or(file_auth.refresh_token_ttl),
            DEFAULT_REFRESH_TOKEN_TTL,
        )?,
    };

    let smtp = env
        .smtp_host
        .clone()
        .or(file_mail.smtp_host)
        .map(|host| SmtpConfig {
            host,
            port: env
                .smtp_port
                .or(file_mail.smtp_port)
                .unwrap_or(DEFAULT_SMTP_PORT),
            username: env.smtp_username.clone().or(file_mail.smtp_username),
            password: env.smtp_password.clone().or(file_mail.smtp_password),
        });
    let mail = MailConfig {
        from_email: env
            .mail_from_email
            .clone()
            .or(file_mail.from_email)
            .unwrap_or_else(|| DEFAULT_FROM_EMAIL.to_string()),
        smtp,
    };

    let cors = CorsConfig {
        allowed_origins: env
            .cors_allowed_origins
            .clone()
            .or(file_cors.allowed_origins)
            .unwrap_or_default(),
    };

    Ok(Config {
        server,
        database,
        auth,
        mail,
        cors,
        dev_mode,
        metadata,
    })
}

fn parse_ttl(
    field: &'static str,
    raw: Option<String>,
    default: &str,
) -> Result<Duration, ConfigLoadError> {
    let value = raw.unwrap_or_else(|| default.to_string());
    humantime::parse_duration(value.trim()).map_err(|source| {
        ConfigLoadError::InvalidDuration {
            field,
            value,
            source,
        }
    })
}
