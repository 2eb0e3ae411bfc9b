//! Cache configuration

use crate::{ConfigError, RefreshMode, RegistryResult};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default snapshot lifetime in seconds.
pub const DEFAULT_CACHE_TTL_SECONDS: u64 = 600;

/// Project seeded into the cache when none is configured.
pub const DEFAULT_PROJECT: &str = "default";

/// Configuration for the registry cache.
///
/// A `ttl_seconds` of zero means the snapshot never expires: on-demand reads
/// never refresh it and background mode never starts its timer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Project whose metadata entry is seeded at construction.
    pub project: String,
    /// Snapshot lifetime, and background refresh period.
    #[serde(default = "default_ttl_seconds")]
    pub ttl_seconds: u64,
    /// How the snapshot is kept current.
    #[serde(default)]
    pub mode: RefreshMode,
}

fn default_ttl_seconds() -> u64 {
    DEFAULT_CACHE_TTL_SECONDS
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            project: DEFAULT_PROJECT.to_string(),
            ttl_seconds: DEFAULT_CACHE_TTL_SECONDS,
            mode: RefreshMode::default(),
        }
    }
}

impl CacheConfig {
    /// Create a config for a project with default TTL and mode.
    pub fn new(project: impl Into<String>) -> Self {
        Self {
            project: project.into(),
            ..Self::default()
        }
    }

    /// Set the TTL in seconds.
    pub fn with_ttl_seconds(mut self, ttl_seconds: u64) -> Self {
        self.ttl_seconds = ttl_seconds;
        self
    }

    /// Set the refresh mode.
    pub fn with_mode(mut self, mode: RefreshMode) -> Self {
        self.mode = mode;
        self
    }

    /// Snapshot lifetime as a duration.
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_seconds)
    }

    /// Create from environment variables with fallback to defaults.
    ///
    /// Environment variables:
    /// - `FEATREG_PROJECT`: Project to seed (default: "default")
    /// - `FEATREG_CACHE_TTL_SECONDS`: Snapshot lifetime, 0 for never (default: 600)
    /// - `FEATREG_CACHE_MODE`: `background`, `on_demand` or `manual`; the
    ///   legacy names `thread` and `sync` are accepted (default: on_demand)
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            project: std::env::var("FEATREG_PROJECT")
                .ok()
                .filter(|s| !s.trim().is_empty())
                .unwrap_or(defaults.project),
            ttl_seconds: std::env::var("FEATREG_CACHE_TTL_SECONDS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.ttl_seconds),
            mode: std::env::var("FEATREG_CACHE_MODE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.mode),
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> RegistryResult<()> {
        if self.project.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "project".to_string(),
                value: self.project.clone(),
                reason: "project must not be empty".to_string(),
            }
            .into());
        }
        Ok(())
    }
}
