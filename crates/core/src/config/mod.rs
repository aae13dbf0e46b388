//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (SKIFF_*)
//! 2. TOML config file (if SKIFF_CONFIG_FILE set)
//! 3. Built-in defaults

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

mod validation;

pub use validation::ConfigError;

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (SKIFF_*)
/// 2. TOML config file (if SKIFF_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to the SQLite durable store.
    ///
    /// Set via SKIFF_DB_PATH environment variable.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// Build-specific suffix embedded in the cache generation name.
    ///
    /// Substituted per deployment; only the generation matching the current
    /// suffix survives activation. Set via SKIFF_BUILD_SUFFIX.
    #[serde(default = "default_build_suffix")]
    pub build_suffix: String,

    /// Base URL of the origin server requests are forwarded to.
    ///
    /// Set via SKIFF_ORIGIN environment variable.
    #[serde(default = "default_origin")]
    pub origin: String,

    /// Address the interception front-end listens on.
    ///
    /// Set via SKIFF_LISTEN_ADDR environment variable.
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    /// Static asset paths pre-populated into the cache on install.
    ///
    /// Set via SKIFF_PRECACHE_PATHS environment variable (comma-separated).
    #[serde(default)]
    pub precache_paths: Vec<String>,

    /// Cookie value attached to with-credentials requests, if any.
    ///
    /// Set via SKIFF_CREDENTIALS_HEADER environment variable.
    #[serde(default)]
    pub credentials_header: Option<String>,

    /// Outbound request timeout in milliseconds.
    ///
    /// Set via SKIFF_TIMEOUT_MS environment variable.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./skiff-store.sqlite")
}

fn default_build_suffix() -> String {
    "dev".into()
}

fn default_origin() -> String {
    "http://127.0.0.1:8080".into()
}

fn default_listen_addr() -> String {
    "127.0.0.1:8787".into()
}

fn default_timeout_ms() -> u64 {
    20_000
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            build_suffix: default_build_suffix(),
            origin: default_origin(),
            listen_addr: default_listen_addr(),
            precache_paths: Vec::new(),
            credentials_header: None,
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl AppConfig {
    /// Timeout as Duration for use with reqwest/tokio.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `SKIFF_`
    /// 2. TOML file from `SKIFF_CONFIG_FILE` (if set)
    /// 3. Built-in defaults via `Default::default()`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("SKIFF_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("SKIFF_")
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }
}
