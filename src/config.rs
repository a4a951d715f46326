// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! Settings are read once at startup from a TOML file (first CLI argument,
//! else `config.toml`; a missing file means all defaults), then overridden
//! from the environment and validated.
//!
//! ## Environment Variables
//!
//! | Variable | Overrides | Default |
//! |----------|-----------|---------|
//! | `GATE_HOST` | `server.host` | `0.0.0.0` |
//! | `GATE_PORT` | `server.port` | `8080` |
//! | `GATE_JWT_SECRET` | `jwt.secret` | none, required |
//! | `GATE_REDIS_URL` | `redis.url` | unset (in-process limiter) |
//! | `GATE_LOG_DIR` | `log.dir` | `logs` |
//! | `GATE_DATA_DIR` | `storage.data_dir` | `data` |
//! | `LOG_FORMAT` | console format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | log filter, wins over `log.level` | unset |
//!
//! ## Example
//!
//! ```toml
//! [server]
//! port = 8080
//!
//! [jwt]
//! secret = "change-me-to-something-long"
//! user_ttl_secs = 86400
//! admin_ttl_secs = 7200
//!
//! [rate_limit]
//! enabled = true
//! window_secs = 1
//! burst = 200
//!
//! [redis]
//! url = "redis://127.0.0.1:6379/0"
//! ```

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

pub const HOST_ENV: &str = "GATE_HOST";
pub const PORT_ENV: &str = "GATE_PORT";
pub const JWT_SECRET_ENV: &str = "GATE_JWT_SECRET";
pub const REDIS_URL_ENV: &str = "GATE_REDIS_URL";
pub const LOG_DIR_ENV: &str = "GATE_LOG_DIR";
pub const DATA_DIR_ENV: &str = "GATE_DATA_DIR";

pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

/// Shortest accepted signing secret, in bytes.
pub const MIN_SECRET_LEN: usize = 16;

/// Longest accepted token lifetime (one year), in seconds.
pub const MAX_TOKEN_TTL_SECS: u64 = 365 * 24 * 60 * 60;

const LOG_LEVELS: [&str; 4] = ["debug", "info", "warn", "error"];

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

impl ConfigError {
    fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field,
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub server: ServerConfig,
    pub jwt: JwtConfig,
    pub rate_limit: RateLimitConfig,
    pub redis: RedisConfig,
    pub log: LogConfig,
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Time in-flight requests get to finish after a shutdown signal.
    pub shutdown_grace_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            shutdown_grace_secs: 5,
        }
    }
}

#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct JwtConfig {
    pub secret: String,
    pub user_ttl_secs: u64,
    pub admin_ttl_secs: u64,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            secret: String::new(),
            user_ttl_secs: 86_400,
            admin_ttl_secs: 7_200,
        }
    }
}

// Keeps the secret out of `{:?}` output.
impl std::fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtConfig")
            .field("secret", &"<redacted>")
            .field("user_ttl_secs", &self.user_ttl_secs)
            .field("admin_ttl_secs", &self.admin_ttl_secs)
            .finish()
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    pub enabled: bool,
    /// Sliding window length in seconds.
    pub window_secs: u64,
    /// Requests allowed per client within one window.
    pub burst: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            window_secs: 1,
            burst: 200,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RedisConfig {
    /// `redis://` URL. When unset the limiter keeps its windows in memory.
    pub url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub level: String,
    pub dir: PathBuf,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            dir: PathBuf::from("logs"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
        }
    }
}

impl Settings {
    /// Load from `path`, apply process environment overrides and validate.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let env: HashMap<String, String> = std::env::vars().collect();
        Self::load_with_env(path, &env)
    }

    pub fn load_with_env(path: &Path, env: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let mut settings = match fs::read_to_string(path) {
            Ok(content) => Self::from_toml(&content)?,
            Err(e) if e.kind() == io::ErrorKind::NotFound => Self::default(),
            Err(source) => {
                return Err(ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        settings.apply_env(env)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    pub fn apply_env(&mut self, env: &HashMap<String, String>) -> Result<(), ConfigError> {
        let non_empty = |name: &str| env.get(name).filter(|v| !v.is_empty()).cloned();

        if let Some(host) = non_empty(HOST_ENV) {
            self.server.host = host;
        }
        if let Some(port) = non_empty(PORT_ENV) {
            self.server.port = port
                .parse()
                .map_err(|_| ConfigError::invalid("server.port", format!("{PORT_ENV}={port}")))?;
        }
        if let Some(secret) = non_empty(JWT_SECRET_ENV) {
            self.jwt.secret = secret;
        }
        if let Some(url) = non_empty(REDIS_URL_ENV) {
            self.redis.url = Some(url);
        }
        if let Some(dir) = non_empty(LOG_DIR_ENV) {
            self.log.dir = PathBuf::from(dir);
        }
        if let Some(dir) = non_empty(DATA_DIR_ENV) {
            self.storage.data_dir = PathBuf::from(dir);
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.jwt.secret.len() < MIN_SECRET_LEN {
            return Err(ConfigError::invalid(
                "jwt.secret",
                format!("must be at least {MIN_SECRET_LEN} bytes (set {JWT_SECRET_ENV})"),
            ));
        }
        for (field, ttl) in [
            ("jwt.user_ttl_secs", self.jwt.user_ttl_secs),
            ("jwt.admin_ttl_secs", self.jwt.admin_ttl_secs),
        ] {
            if ttl == 0 || ttl > MAX_TOKEN_TTL_SECS {
                return Err(ConfigError::invalid(
                    field,
                    format!("must be between 1 and {MAX_TOKEN_TTL_SECS}"),
                ));
            }
        }
        if self.rate_limit.window_secs == 0 {
            return Err(ConfigError::invalid("rate_limit.window_secs", "must be > 0"));
        }
        if self.rate_limit.burst == 0 {
            return Err(ConfigError::invalid("rate_limit.burst", "must be > 0"));
        }
        if !LOG_LEVELS.contains(&self.log.level.as_str()) {
            return Err(ConfigError::invalid(
                "log.level",
                format!("'{}' is not one of {}", self.log.level, LOG_LEVELS.join(", ")),
            ));
        }
        Ok(())
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    pub fn user_ttl(&self) -> Duration {
        Duration::from_secs(self.jwt.user_ttl_secs)
    }

    pub fn admin_ttl(&self) -> Duration {
        Duration::from_secs(self.jwt.admin_ttl_secs)
    }

    pub fn rate_window(&self) -> Duration {
        Duration::from_secs(self.rate_limit.window_secs)
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(self.server.shutdown_grace_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const SECRET: &str = "0123456789abcdef0123";

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let settings = Settings::from_toml(
            r#"
            [jwt]
            secret = "0123456789abcdef0123"

            [rate_limit]
            burst = 5
            window_secs = 10
            "#,
        )
        .unwrap();

        assert_eq!(settings.server.port, 8080);
        assert_eq!(settings.server.shutdown_grace_secs, 5);
        assert_eq!(settings.jwt.user_ttl_secs, 86_400);
        assert_eq!(settings.jwt.admin_ttl_secs, 7_200);
        assert!(settings.rate_limit.enabled);
        assert_eq!(settings.rate_limit.burst, 5);
        assert_eq!(settings.rate_window(), Duration::from_secs(10));
        assert!(settings.redis.url.is_none());
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn env_overrides_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[server]\nport = 9000\n[jwt]\nsecret = \"from-file-secret-123\"\n").unwrap();

        let settings = Settings::load_with_env(
            &path,
            &env(&[
                (PORT_ENV, "9100"),
                (JWT_SECRET_ENV, SECRET),
                (REDIS_URL_ENV, "redis://cache:6379"),
                (DATA_DIR_ENV, "/srv/gate"),
                (HOST_ENV, ""),
            ]),
        )
        .unwrap();

        assert_eq!(settings.server.port, 9100);
        assert_eq!(settings.server.host, "0.0.0.0");
        assert_eq!(settings.jwt.secret, SECRET);
        assert_eq!(settings.redis.url.as_deref(), Some("redis://cache:6379"));
        assert_eq!(settings.storage.data_dir, PathBuf::from("/srv/gate"));
        assert_eq!(settings.bind_addr(), "0.0.0.0:9100");
    }

    #[test]
    fn missing_file_uses_defaults_plus_env() {
        let dir = TempDir::new().unwrap();
        let settings =
            Settings::load_with_env(&dir.path().join("absent.toml"), &env(&[(JWT_SECRET_ENV, SECRET)]))
                .unwrap();
        assert_eq!(settings.log.level, "info");
        assert_eq!(settings.log.dir, PathBuf::from("logs"));
    }

    #[test]
    fn short_or_missing_secret_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("absent.toml");

        let err = Settings::load_with_env(&path, &env(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "jwt.secret", .. }));

        let err = Settings::load_with_env(&path, &env(&[(JWT_SECRET_ENV, "short")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "jwt.secret", .. }));
    }

    #[test]
    fn bad_values_are_rejected() {
        let mut settings = Settings::default();
        settings.jwt.secret = SECRET.to_string();
        assert!(settings.validate().is_ok());

        settings.rate_limit.burst = 0;
        assert!(settings.validate().is_err());
        settings.rate_limit.burst = 1;

        settings.log.level = "verbose".to_string();
        assert!(settings.validate().is_err());
        settings.log.level = "debug".to_string();

        settings.jwt.user_ttl_secs = 0;
        assert!(settings.validate().is_err());

        let err = settings
            .apply_env(&env(&[(PORT_ENV, "not-a-port")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "server.port", .. }));
    }

    #[test]
    fn oversized_token_lifetimes_are_rejected() {
        let mut settings = Settings::from_toml(
            r#"
            [jwt]
            secret = "0123456789abcdef0123"
            user_ttl_secs = 9223372036854775807
            "#,
        )
        .unwrap();
        let err = settings.validate().unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "jwt.user_ttl_secs", .. }));

        settings.jwt.user_ttl_secs = MAX_TOKEN_TTL_SECS;
        assert!(settings.validate().is_ok());

        settings.jwt.admin_ttl_secs = MAX_TOKEN_TTL_SECS + 1;
        let err = settings.validate().unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "jwt.admin_ttl_secs", .. }));
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        assert!(matches!(
            Settings::from_toml("[server\nport = 1"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn debug_output_redacts_secret() {
        let mut settings = Settings::default();
        settings.jwt.secret = SECRET.to_string();
        let rendered = format!("{settings:?}");
        assert!(!rendered.contains(SECRET));
        assert!(rendered.contains("<redacted>"));
    }
}
