//! Configuration for the YaMDb server.
//!
//! Values come from an optional TOML file (`yamdb.toml`, `config/yamdb.toml`
//! or the path in `YAMDB_CONFIG`), overridden by environment variables and
//! an optional `.env` file. [`ConfigLoader`] composes them and applies guard
//! rails that refuse unsafe settings outside `DEV_MODE`.

pub mod constants;
pub mod loader;
pub mod models;
pub mod util;
pub mod validation;

pub use loader::{ConfigLoad, ConfigLoader, ConfigLoaderOptions, error::ConfigLoadError};
pub use models::sources::{EnvConfig, FileConfig};
pub use models::{
    AuthConfig, Config, ConfigMetadata, CorsConfig, DatabaseConfig,
    MailConfig, ServerConfig, SmtpConfig,
};
pub use validation::{ConfigGuardRailError, ConfigWarning, ConfigWarnings};
