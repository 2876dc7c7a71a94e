//! Configuration Module
//!
//! Handles loading cache configuration from environment variables.

use std::env;
use std::time::Duration;

/// Default content cache TTL in seconds.
pub const DEFAULT_CONTENT_TTL: u64 = 10;

/// Cache configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// TTL in seconds applied to every content cache write
    pub content_ttl: u64,
    /// Timeout in seconds for HTTP origin requests
    pub origin_timeout: u64,
    /// Background cleanup task interval in seconds
    pub cleanup_interval: u64,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CONTENT_TTL` - Content cache TTL in seconds (default: 10)
    /// - `ORIGIN_TIMEOUT` - HTTP origin timeout in seconds (default: 30)
    /// - `CLEANUP_INTERVAL` - Cleanup frequency in seconds (default: 1)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            content_ttl: env_or("CONTENT_TTL", defaults.content_ttl),
            origin_timeout: env_or("ORIGIN_TIMEOUT", defaults.origin_timeout),
            cleanup_interval: env_or("CLEANUP_INTERVAL", defaults.cleanup_interval),
        }
    }

    /// Content cache TTL as a `Duration`.
    pub fn content_ttl(&self) -> Duration {
        Duration::from_secs(self.content_ttl)
    }

    /// Origin timeout as a `Duration`.
    pub fn origin_timeout(&self) -> Duration {
        Duration::from_secs(self.origin_timeout)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            content_ttl: DEFAULT_CONTENT_TTL,
            origin_timeout: 30,
            cleanup_interval: 1,
        }
    }
}

fn env_or(name: &str, default: u64) -> u64 {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
