use std::env;

use chrono::Duration;
use chrono::Utc;
use config::builder::DefaultState;
use config::ConfigBuilder;
use config::ConfigError;
use config::Environment;
use config::File;
use serde::Deserialize;

use crate::domain::session::models::SessionSettings;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub jwt: JwtConfig,
    pub cors: CorsConfig,
    pub storage: StorageConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    /// Required by the `postgres` storage backend only.
    pub url: Option<String>,
    pub max_connections: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub http_port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub algorithm: String,
    pub access_token_expire_minutes: i64,
    pub refresh_token_expire_days: i64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CorsConfig {
    pub frontend_url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    pub backend: StorageBackend,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Postgres,
    Memory,
}

impl Config {
    /// Load configuration from files with environment variable overrides
    ///
    /// Priority (highest to lowest):
    /// 1. Environment variables (JWT__SECRET, DATABASE__URL, SERVER__HTTP_PORT, etc.)
    /// 2. Environment-specific config file (config/{environment}.toml)
    /// 3. Default config file (config/default.toml)
    /// 4. Built-in defaults
    pub fn load() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let configuration = Self::defaults()?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // Example: DATABASE__URL=postgres://... overrides database.url
            .add_source(Environment::default().separator("__"))
            .build()?;

        let config: Config = configuration.try_deserialize()?;
        config.validate()?;

        Ok(config)
    }

    fn defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        config::Config::builder()
            .set_default("database.max_connections", 5)?
            .set_default("server.http_port", 8000)?
            .set_default("jwt.algorithm", "HS256")?
            .set_default("jwt.access_token_expire_minutes", 30)?
            .set_default("jwt.refresh_token_expire_days", 7)?
            .set_default("cors.frontend_url", "http://localhost:3000")?
            .set_default("storage.backend", "postgres")
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.jwt.secret.is_empty() {
            return Err(ConfigError::Message("jwt.secret must be set".to_string()));
        }
        if self.jwt.access_token_expire_minutes <= 0 || self.jwt.refresh_token_expire_days <= 0 {
            return Err(ConfigError::Message(
                "token lifetimes must be positive".to_string(),
            ));
        }
        let (Some(access_token_ttl), Some(refresh_token_ttl)) = (
            Duration::try_minutes(self.jwt.access_token_expire_minutes),
            Duration::try_days(self.jwt.refresh_token_expire_days),
        ) else {
            return Err(ConfigError::Message(
                "token lifetimes are out of range".to_string(),
            ));
        };
        let now = Utc::now();
        if now.checked_add_signed(access_token_ttl).is_none()
            || now.checked_add_signed(refresh_token_ttl).is_none()
        {
            return Err(ConfigError::Message(
                "token lifetimes are out of range".to_string(),
            ));
        }
        if self.storage.backend == StorageBackend::Postgres && self.database.url.is_none() {
            return Err(ConfigError::Message(
                "database.url is required for the postgres storage backend".to_string(),
            ));
        }
        Ok(())
    }

    /// Token lifetimes for the session manager. Values that `validate`
    /// would reject fall back to the defaults.
    pub fn session_settings(&self) -> SessionSettings {
        let defaults = SessionSettings::default();
        SessionSettings {
            access_token_ttl: Duration::try_minutes(self.jwt.access_token_expire_minutes)
                .unwrap_or(defaults.access_token_ttl),
            refresh_token_ttl: Duration::try_days(self.jwt.refresh_token_expire_days)
                .unwrap_or(defaults.refresh_token_ttl),
        }
    }
}
