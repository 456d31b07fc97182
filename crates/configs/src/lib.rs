//! # configs
//!
//! Layered settings: built-in defaults, then `config/default.toml`, then
//! `config/{YATUBE_ENV}.toml`, then `YATUBE__SECTION__KEY` environment variables.

use std::path::Path;

use config::{Config, Environment, File};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

pub const ENV_PREFIX: &str = "YATUBE";
pub const ENV_SELECTOR: &str = "YATUBE_ENV";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot load settings: {0}")]
    Load(#[from] config::ConfigError),
    #[error("invalid settings: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub database: DatabaseSettings,
    pub auth: AuthSettings,
    pub media: MediaSettings,
    pub cache: CacheSettings,
    pub pagination: PaginationSettings,
    pub log: LogSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    /// Request body limit; bounds image uploads
    pub max_upload_bytes: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthSettings {
    pub jwt_secret: SecretString,
    pub session_ttl_secs: u64,
    /// Adds `Secure` to the session cookie; turn on behind TLS
    pub secure_cookie: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MediaSettings {
    pub root: String,
    pub url_prefix: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackend {
    Memory,
    Redis,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CacheSettings {
    pub backend: CacheBackend,
    pub redis_url: Option<SecretString>,
    pub index_ttl_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PaginationSettings {
    pub page_size: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogSettings {
    pub level: String,
    pub format: LogFormat,
}

impl Settings {
    /// Loads from `./config` and the process environment, honoring `.env`.
    pub fn load() -> Result<Self, ConfigError> {
        if let Ok(path) = dotenvy::dotenv() {
            debug!(path = %path.display(), ".env loaded");
        }
        let env = std::env::var(ENV_SELECTOR).unwrap_or_else(|_| "development".to_string());
        Self::load_from(Path::new("config"), &env)
    }

    pub fn load_from(dir: &Path, env: &str) -> Result<Self, ConfigError> {
        let settings: Settings = Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8000)?
            .set_default("server.max_upload_bytes", 5 * 1024 * 1024)?
            .set_default("database.url", "sqlite://yatube.db")?
            .set_default("database.max_connections", 5)?
            .set_default("auth.jwt_secret", "")?
            .set_default("auth.session_ttl_secs", 14 * 24 * 60 * 60)?
            .set_default("auth.secure_cookie", false)?
            .set_default("media.root", "media")?
            .set_default("media.url_prefix", "/media")?
            .set_default("cache.backend", "memory")?
            .set_default("cache.index_ttl_secs", 20)?
            .set_default("pagination.page_size", 10)?
            .set_default("log.level", "info")?
            .set_default("log.format", "pretty")?
            .add_source(File::with_name(&dir.join("default").to_string_lossy()).required(false))
            .add_source(File::with_name(&dir.join(env).to_string_lossy()).required(false))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.pagination.page_size == 0 {
            return Err(ConfigError::Invalid("pagination.page_size must be positive".into()));
        }
        if self.cache.index_ttl_secs == 0 {
            return Err(ConfigError::Invalid("cache.index_ttl_secs must be positive".into()));
        }
        if self.auth.session_ttl_secs == 0 {
            return Err(ConfigError::Invalid("auth.session_ttl_secs must be positive".into()));
        }
        if self.auth.jwt_secret.expose_secret().trim().is_empty() {
            return Err(ConfigError::Invalid("auth.jwt_secret is required".into()));
        }
        if self.cache.backend == CacheBackend::Redis && self.cache.redis_url.is_none() {
            return Err(ConfigError::Invalid(
                "cache.redis_url is required for the redis backend".into(),
            ));
        }
        Ok(())
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    fn dir_with(files: &[(&str, &str)]) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        for (name, body) in files {
            fs::write(dir.path().join(name), body).unwrap();
        }
        dir
    }

    #[test]
    fn defaults_apply_under_file_overrides() {
        let dir = dir_with(&[(
            "default.toml",
            "[auth]\njwt_secret = \"file-secret\"\n[server]\nport = 9000\n",
        )]);

        let settings = Settings::load_from(dir.path(), "test").unwrap();
        assert_eq!(settings.server.port, 9000);
        assert_eq!(settings.pagination.page_size, 10);
        assert_eq!(settings.cache.index_ttl_secs, 20);
        assert_eq!(settings.cache.backend, CacheBackend::Memory);
        assert_eq!(settings.auth.jwt_secret.expose_secret(), "file-secret");
    }

    #[test]
    fn environment_file_wins_over_default_file() {
        let dir = dir_with(&[
            ("default.toml", "[auth]\njwt_secret = \"s\"\n[log]\nformat = \"pretty\"\n"),
            ("production.toml", "[log]\nformat = \"json\"\n"),
        ]);

        let settings = Settings::load_from(dir.path(), "production").unwrap();
        assert_eq!(settings.log.format, LogFormat::Json);
    }

    #[test]
    fn missing_secret_is_rejected() {
        let dir = dir_with(&[]);
        let err = Settings::load_from(dir.path(), "test").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(msg) if msg.contains("jwt_secret")));
    }

    #[test]
    fn zero_page_size_is_rejected() {
        let dir = dir_with(&[(
            "default.toml",
            "[auth]\njwt_secret = \"s\"\n[pagination]\npage_size = 0\n",
        )]);
        assert!(Settings::load_from(dir.path(), "test").is_err());
    }
}
