//! Refresh policy: when the cached snapshot counts as stale.
//!
//! Staleness only matters to on-demand mode. Background mode replaces the
//! snapshot on a timer and manual mode never replaces it on its own, so
//! neither checks the TTL at read time.

use std::time::Duration;

use featreg_core::{CacheConfig, RefreshMode};
use tokio::time::Instant;

/// TTL and mode, fixed for the lifetime of a cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshPolicy {
    ttl: Duration,
    mode: RefreshMode,
}

impl RefreshPolicy {
    /// Create a policy. A zero TTL means the snapshot never expires.
    pub fn new(ttl: Duration, mode: RefreshMode) -> Self {
        Self { ttl, mode }
    }

    pub fn from_config(config: &CacheConfig) -> Self {
        Self::new(config.ttl(), config.mode)
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn mode(&self) -> RefreshMode {
        self.mode
    }

    /// Returns true if the snapshot never expires.
    pub fn is_infinite(&self) -> bool {
        self.ttl.is_zero()
    }

    /// Whether cached reads must check staleness before serving.
    pub fn checks_on_read(&self) -> bool {
        self.mode == RefreshMode::OnDemand && !self.is_infinite()
    }

    /// Period of the background refresh task, if one should run.
    pub fn background_period(&self) -> Option<Duration> {
        match self.mode {
            RefreshMode::Background if !self.is_infinite() => Some(self.ttl),
            _ => None,
        }
    }

    /// When a snapshot loaded at `loaded_at` expires, if it ever does.
    ///
    /// A TTL too large to represent as an instant never expires.
    pub fn expires_at(&self, loaded_at: Instant) -> Option<Instant> {
        if self.is_infinite() {
            None
        } else {
            loaded_at.checked_add(self.ttl)
        }
    }

    /// Whether a snapshot loaded at `loaded_at` is stale at `now`.
    ///
    /// Stale means strictly past the expiry instant.
    pub fn is_stale(&self, loaded_at: Instant, now: Instant) -> bool {
        match self.expires_at(loaded_at) {
            Some(expires_at) => now > expires_at,
            None => false,
        }
    }
}
