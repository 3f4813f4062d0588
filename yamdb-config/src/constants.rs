/// Token signing key used when `dev_mode` is on and no key is configured.
pub const DEV_TOKEN_KEY: &str = "yamdb-development-token-key-do-not-use-in-production";

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_MAX_CONNECTIONS: u32 = 10;
pub const DEFAULT_ACCESS_TOKEN_TTL: &str = "1d";
pub const DEFAULT_REFRESH_TOKEN_TTL: &str = "30d";
pub const DEFAULT_FROM_EMAIL: &str = "noreply@yamdb.local";
pub const DEFAULT_SMTP_PORT: u16 = 587;

/// Keys shorter than this are accepted with a warning.
pub const MIN_TOKEN_KEY_LEN: usize = 32;
