//! Configuration Module
//!
//! Handles loading and managing cache configuration from environment variables,
//! runtime updates, and the cleanup-task settings derived from it.

use std::env;

use serde::{Deserialize, Serialize};

// == Cache Config ==
/// Cache configuration parameters.
///
/// All values can be configured via environment variables with sensible
/// defaults. The live configuration can also be adjusted at runtime through
/// [`CacheConfigUpdate`] and is persisted to durable storage, which overrides
/// these defaults on the next start.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Maximum total payload size the cache can hold, in bytes
    pub max_size: usize,
    /// Maximum number of entries the cache can hold
    pub max_entries: usize,
    /// Advisory default TTL in milliseconds; callers pass explicit TTLs per entry
    pub default_ttl_ms: u64,
    /// Whether the background expired-entry sweep runs
    pub enable_auto_cleanup: bool,
    /// Interval between background sweeps, in milliseconds
    pub cleanup_interval_ms: u64,
}

impl CacheConfig {
    /// Creates a new CacheConfig by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_MAX_SIZE` - Maximum total size in bytes (default: 52428800, 50 MiB)
    /// - `CACHE_MAX_ENTRIES` - Maximum cache entries (default: 1000)
    /// - `CACHE_DEFAULT_TTL_MS` - Advisory default TTL in ms (default: 3600000)
    /// - `CACHE_ENABLE_AUTO_CLEANUP` - Enable the background sweep (default: true)
    /// - `CACHE_CLEANUP_INTERVAL_MS` - Sweep interval in ms (default: 300000)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_size: env::var("CACHE_MAX_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.max_size),
            max_entries: env::var("CACHE_MAX_ENTRIES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.max_entries),
            default_ttl_ms: env::var("CACHE_DEFAULT_TTL_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.default_ttl_ms),
            enable_auto_cleanup: env::var("CACHE_ENABLE_AUTO_CLEANUP")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.enable_auto_cleanup),
            cleanup_interval_ms: env::var("CACHE_CLEANUP_INTERVAL_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.cleanup_interval_ms),
        }
    }

    /// Merges a partial update into this configuration.
    ///
    /// Only the fields present in the update are changed.
    pub fn apply(&mut self, update: &CacheConfigUpdate) {
        if let Some(max_size) = update.max_size {
            self.max_size = max_size;
        }
        if let Some(max_entries) = update.max_entries {
            self.max_entries = max_entries;
        }
        if let Some(default_ttl_ms) = update.default_ttl_ms {
            self.default_ttl_ms = default_ttl_ms;
        }
        if let Some(enable_auto_cleanup) = update.enable_auto_cleanup {
            self.enable_auto_cleanup = enable_auto_cleanup;
        }
        if let Some(cleanup_interval_ms) = update.cleanup_interval_ms {
            self.cleanup_interval_ms = cleanup_interval_ms;
        }
    }

    /// Returns the settings the background cleanup task runs with.
    pub fn cleanup_settings(&self) -> CleanupSettings {
        CleanupSettings {
            enabled: self.enable_auto_cleanup,
            interval_ms: self.cleanup_interval_ms,
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_size: 50 * 1024 * 1024,
            max_entries: 1000,
            default_ttl_ms: 60 * 60 * 1000,
            enable_auto_cleanup: true,
            cleanup_interval_ms: 5 * 60 * 1000,
        }
    }
}

// == Cache Config Update ==
/// Partial configuration change applied through `CacheManager::update_config`.
///
/// `None` fields leave the current value untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CacheConfigUpdate {
    /// New maximum total size in bytes
    pub max_size: Option<usize>,
    /// New maximum entry count
    pub max_entries: Option<usize>,
    /// New advisory default TTL in milliseconds
    pub default_ttl_ms: Option<u64>,
    /// Enable or disable the background sweep
    pub enable_auto_cleanup: Option<bool>,
    /// New sweep interval in milliseconds
    pub cleanup_interval_ms: Option<u64>,
}

// == Cleanup Settings ==
/// Snapshot of the cleanup-related configuration, published to the background
/// sweep task whenever it changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CleanupSettings {
    /// Whether the sweep runs at all
    pub enabled: bool,
    /// Interval between sweeps, in milliseconds
    pub interval_ms: u64,
}
