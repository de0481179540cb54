use std::env;

use config::Config as ConfigBuilder;
use config::ConfigError;
use config::Environment;
use config::File;
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub jwt: JwtConfig,
    pub otp: OtpConfig,
    pub smtp: SmtpConfig,
    pub reset: ResetConfig,
    pub roster: RosterConfig,
    pub documents: DocumentsConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub http_port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct JwtConfig {
    pub secret: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct OtpConfig {
    /// Validity window of an issued code, in seconds. The server-issued
    /// expiry is the single source of truth; clients echo it back.
    pub window_seconds: i64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SmtpConfig {
    /// Leave empty to run the mailer in no-op mode (log only).
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub from: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ResetConfig {
    /// Frontend base URL the reset link is built on, e.g.
    /// `http://localhost:5173`.
    pub url_base: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RosterConfig {
    /// Path to the institution-provided enrollment roster (JSON).
    pub path: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DocumentsConfig {
    pub dir: String,
    pub public_base: String,
}

impl Config {
    /// Load configuration from files with environment variable overrides
    ///
    /// Priority (highest to lowest):
    /// 1. Environment variables (DATABASE__URL, SERVER__HTTP_PORT, etc.)
    /// 2. Environment-specific config file (config/{environment}.toml)
    /// 3. Default config file (config/default.toml)
    pub fn load() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let configuration = ConfigBuilder::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // Example: DATABASE__URL=postgres://... overrides database.url
            .add_source(Environment::with_prefix("").separator("__"))
            .build()?;

        let config: Config = configuration.try_deserialize()?;

        Ok(config)
    }
}
