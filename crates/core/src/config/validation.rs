//! Configuration validation rules.
//!
//! This module provides validation logic for `AppConfig` values
//! after they have been loaded from environment, files, or defaults.

use crate::config::AppConfig;
use std::net::SocketAddr;
use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },
}

impl AppConfig {
    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if:
    /// - `build_suffix` is empty
    /// - `origin` is not an http(s) URL
    /// - `listen_addr` is not a socket address
    /// - `timeout_ms` is less than 100ms or exceeds 5 minutes
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.build_suffix.is_empty() {
            return Err(ConfigError::Invalid { field: "build_suffix".into(), reason: "must not be empty".into() });
        }

        if !self.origin.starts_with("http://") && !self.origin.starts_with("https://") {
            return Err(ConfigError::Invalid { field: "origin".into(), reason: "must be an http(s) URL".into() });
        }

        if self.listen_addr.parse::<SocketAddr>().is_err() {
            return Err(ConfigError::Invalid {
                field: "listen_addr".into(),
                reason: "must be a socket address like 127.0.0.1:8787".into(),
            });
        }

        if self.timeout_ms < 100 {
            return Err(ConfigError::Invalid { field: "timeout_ms".into(), reason: "must be at least 100ms".into() });
        }
        if self.timeout_ms > 300_000 {
            return Err(ConfigError::Invalid {
                field: "timeout_ms".into(),
                reason: "must not exceed 5 minutes (300000ms)".into(),
            });
        }

        for path in &self.precache_paths {
            if !path.starts_with('/') {
                return Err(ConfigError::Invalid {
                    field: "precache_paths".into(),
                    reason: format!("{path} must be an absolute path"),
                });
            }
        }

        Ok(())
    }
}
