use config::ConfigError;
use serde::Deserialize;
use serde::Serialize;

use crate::Error;
use crate::Result;

/// Discovery cache tuning parameters
///
/// Controls the background snapshot refresher and the bounds applied to
/// live source queries issued on the find path.
#[derive(Debug, Serialize, Deserialize, Clone, Copy)]
pub struct CacheConfig {
    /// Interval between full snapshot refreshes, in milliseconds
    #[serde(default = "default_refresh_interval_ms")]
    pub refresh_interval_ms: u64,

    /// Random jitter added to each refresh tick, in milliseconds
    ///
    /// Spreads refresh load when many cachers share one backend.
    #[serde(default = "default_refresh_jitter_ms")]
    pub refresh_jitter_ms: u64,

    /// Per-source timeout for fan-out searches, in milliseconds
    ///
    /// A source exceeding this is counted as failed for the request.
    #[serde(default = "default_search_timeout_ms")]
    pub search_timeout_ms: u64,

    /// Maximum number of entries held by the find cache
    #[serde(default = "default_find_cache_capacity")]
    pub find_cache_capacity: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            refresh_interval_ms: default_refresh_interval_ms(),
            refresh_jitter_ms: default_refresh_jitter_ms(),
            search_timeout_ms: default_search_timeout_ms(),
            find_cache_capacity: default_find_cache_capacity(),
        }
    }
}

impl CacheConfig {
    /// Validates cache tuning parameters
    ///
    /// Returns error if:
    /// - `refresh_interval_ms` is out of range (100-3600000)
    /// - `refresh_jitter_ms` is not smaller than the refresh interval
    /// - `search_timeout_ms` is 0
    /// - `find_cache_capacity` is 0
    pub fn validate(&self) -> Result<()> {
        // Range: 100ms to 1 hour
        if !(100..=3_600_000).contains(&self.refresh_interval_ms) {
            return Err(Error::Config(ConfigError::Message(format!(
                "refresh_interval_ms must be between 100 and 3600000, got {}",
                self.refresh_interval_ms
            ))));
        }

        if self.refresh_jitter_ms >= self.refresh_interval_ms {
            return Err(Error::Config(ConfigError::Message(format!(
                "refresh_jitter_ms ({}) must be smaller than refresh_interval_ms ({})",
                self.refresh_jitter_ms, self.refresh_interval_ms
            ))));
        }

        if self.search_timeout_ms == 0 {
            return Err(Error::Config(ConfigError::Message(
                "search_timeout_ms cannot be 0".into(),
            )));
        }

        if self.find_cache_capacity == 0 {
            return Err(Error::Config(ConfigError::Message(
                "find_cache_capacity cannot be 0".into(),
            )));
        }

        Ok(())
    }
}

fn default_refresh_interval_ms() -> u64 {
    30_000
}

fn default_refresh_jitter_ms() -> u64 {
    3_000
}

fn default_search_timeout_ms() -> u64 {
    3_000
}

fn default_find_cache_capacity() -> usize {
    10_000
}
