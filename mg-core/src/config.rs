//! # Configuration
//!
//! A minimal, framework-agnostic key/value store (`RawConfig`) in the same
//! spirit as Feathers' `app.set()` / `app.get()` — no TOML/JSON/YAML format
//! lock-in, environment-agnostic by design. [`AppConfig`] layers typed,
//! validated accessors on top of it for the settings spec.md §6 requires at
//! process startup.
//!
//! ## Environment overrides
//!
//! ```bash
//! export MG__DB_DSN=postgres://localhost/mg
//! export MG__BROKER_URL=memory://local
//! export MG__JWT_SECRET=$(openssl rand -hex 32)
//! ```
//!
//! ```rust
//! use mg_core::config::RawConfig;
//! pub fn load_env_config(raw: &mut RawConfig, prefix: &str) {
//!     for (key, value) in std::env::vars() {
//!         if let Some(stripped) = key.strip_prefix(prefix) {
//!             let normalized = stripped.to_lowercase().replace("__", ".");
//!             raw.set(normalized, value);
//!         }
//!     }
//! }
//! ```

use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Default, Clone)]
pub struct RawConfig {
    values: HashMap<String, String>,
}

impl RawConfig {
    pub fn new() -> Self {
        Self { values: HashMap::new() }
    }

    /// Load every `MG__*` environment variable into the store, e.g.
    /// `MG__DB_DSN` → key `db_dsn`.
    pub fn from_env(prefix: &str) -> Self {
        let mut raw = Self::new();
        for (key, value) in std::env::vars() {
            if let Some(stripped) = key.strip_prefix(prefix) {
                raw.set(stripped.to_lowercase(), value);
            }
        }
        raw
    }

    pub fn set<K, V>(&mut self, key: K, value: V)
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.values.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(|s| s.as_str())
    }

    pub fn has(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }
}

/// Configuration-load-time failures (spec.md §6 "Configuration surface").
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set and non-empty")]
    MissingRequired(&'static str),

    #[error("jwt_secret must be at least 32 characters (got {0})")]
    JwtSecretTooShort(usize),

    #[error("cors_allow_origins must not contain '*' when environment=production")]
    WildcardCorsInProduction,

    #[error("{field} must be a positive integer, got '{value}'")]
    InvalidInteger { field: &'static str, value: String },
}

/// Validated, typed process configuration. Construct via [`AppConfig::load`].
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub db_dsn: String,
    pub broker_url: String,
    pub jwt_secret: String,
    pub cors_allow_origins: Vec<String>,
    pub environment: String,
    pub worker_concurrency: usize,
    pub soft_timeout_secs: u64,
    pub hard_timeout_secs: u64,
    pub stuck_threshold_secs: u64,
    pub max_retries: u32,
    pub base_retry_backoff_secs: u64,
    pub max_retry_backoff_secs: u64,
    pub retry_jitter: bool,
    pub tts_base_url: Option<String>,
    pub image_base_url: Option<String>,
    pub digital_human_base_url: Option<String>,
    pub llm_base_url: Option<String>,
}

impl AppConfig {
    /// Validate and materialize typed config from a raw key/value store.
    ///
    /// Required, non-empty: `db_dsn`, `broker_url`, `jwt_secret` (≥ 32
    /// chars). `cors_allow_origins` must not contain `*` when
    /// `environment=production`.
    pub fn load(raw: &RawConfig) -> Result<Self, ConfigError> {
        let db_dsn = required_nonempty(raw, "db_dsn")?;
        let broker_url = required_nonempty(raw, "broker_url")?;
        let jwt_secret = required_nonempty(raw, "jwt_secret")?;
        if jwt_secret.len() < 32 {
            return Err(ConfigError::JwtSecretTooShort(jwt_secret.len()));
        }

        let environment = raw.get("environment").unwrap_or("development").to_string();
        let cors_allow_origins: Vec<String> = raw
            .get("cors_allow_origins")
            .unwrap_or("")
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        if environment == "production" && cors_allow_origins.iter().any(|o| o == "*") {
            return Err(ConfigError::WildcardCorsInProduction);
        }

        Ok(Self {
            db_dsn,
            broker_url,
            jwt_secret,
            cors_allow_origins,
            environment,
            worker_concurrency: parse_usize(raw, "worker_concurrency", 10)?,
            soft_timeout_secs: parse_u64(raw, "soft_timeout_secs", 55 * 60)?,
            hard_timeout_secs: parse_u64(raw, "hard_timeout_secs", 60 * 60)?,
            stuck_threshold_secs: parse_u64(raw, "stuck_threshold_secs", 15 * 60)?,
            max_retries: parse_u32(raw, "max_retries", 3)?,
            base_retry_backoff_secs: parse_u64(raw, "base_retry_backoff_secs", 1)?,
            max_retry_backoff_secs: parse_u64(raw, "max_retry_backoff_secs", 600)?,
            retry_jitter: raw.get("retry_jitter").map(|v| v == "true").unwrap_or(true),
            tts_base_url: raw.get("tts_base_url").map(String::from),
            image_base_url: raw.get("image_base_url").map(String::from),
            digital_human_base_url: raw.get("digital_human_base_url").map(String::from),
            llm_base_url: raw.get("llm_base_url").map(String::from),
        })
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

fn required_nonempty(raw: &RawConfig, key: &'static str) -> Result<String, ConfigError> {
    match raw.get(key) {
        Some(v) if !v.trim().is_empty() => Ok(v.to_string()),
        _ => Err(ConfigError::MissingRequired(key)),
    }
}

fn parse_usize(raw: &RawConfig, key: &'static str, default: usize) -> Result<usize, ConfigError> {
    match raw.get(key) {
        None => Ok(default),
        Some(v) => v.parse().map_err(|_| ConfigError::InvalidInteger { field: key, value: v.to_string() }),
    }
}

fn parse_u64(raw: &RawConfig, key: &'static str, default: u64) -> Result<u64, ConfigError> {
    match raw.get(key) {
        None => Ok(default),
        Some(v) => v.parse().map_err(|_| ConfigError::InvalidInteger { field: key, value: v.to_string() }),
    }
}

fn parse_u32(raw: &RawConfig, key: &'static str, default: u32) -> Result<u32, ConfigError> {
    match raw.get(key) {
        None => Ok(default),
        Some(v) => v.parse().map_err(|_| ConfigError::InvalidInteger { field: key, value: v.to_string() }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_raw() -> RawConfig {
        let mut raw = RawConfig::new();
        raw.set("db_dsn", "postgres://localhost/mg");
        raw.set("broker_url", "memory://local");
        raw.set("jwt_secret", "a".repeat(32));
        raw
    }

    #[test]
    fn loads_with_defaults() {
        let cfg = AppConfig::load(&valid_raw()).unwrap();
        assert_eq!(cfg.worker_concurrency, 10);
        assert_eq!(cfg.max_retries, 3);
        assert!(!cfg.is_production());
    }

    #[test]
    fn rejects_missing_db_dsn() {
        let mut raw = valid_raw();
        raw.set("db_dsn", "");
        assert_eq!(AppConfig::load(&raw), Err(ConfigError::MissingRequired("db_dsn")));
    }

    #[test]
    fn rejects_short_jwt_secret() {
        let mut raw = valid_raw();
        raw.set("jwt_secret", "too-short");
        assert_eq!(AppConfig::load(&raw), Err(ConfigError::JwtSecretTooShort(9)));
    }

    #[test]
    fn rejects_wildcard_cors_in_production() {
        let mut raw = valid_raw();
        raw.set("environment", "production");
        raw.set("cors_allow_origins", "*");
        assert_eq!(AppConfig::load(&raw), Err(ConfigError::WildcardCorsInProduction));
    }

    #[test]
    fn allows_wildcard_cors_outside_production() {
        let mut raw = valid_raw();
        raw.set("cors_allow_origins", "*");
        assert!(AppConfig::load(&raw).is_ok());
    }
}
