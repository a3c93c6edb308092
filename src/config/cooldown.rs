use config::ConfigError;
use serde::Deserialize;
use serde::Serialize;

use crate::Error;
use crate::Result;

/// Stale-entry repair policy for the find cache
///
/// After a cached result is repaired from a live source, the entry enters a
/// cooling period during which further revision mismatches are served from
/// cache instead of triggering another live query.
#[derive(Debug, Serialize, Deserialize, Clone, Copy)]
pub struct CooldownPolicy {
    /// Cooling period entered after a repair attempt, in milliseconds
    #[serde(default = "default_cooldown_ms")]
    pub cooldown_ms: u64,

    /// Timeout for the live query issued by a repair, in milliseconds
    #[serde(default = "default_live_timeout_ms")]
    pub live_timeout_ms: u64,
}

impl Default for CooldownPolicy {
    fn default() -> Self {
        Self {
            cooldown_ms: default_cooldown_ms(),
            live_timeout_ms: default_live_timeout_ms(),
        }
    }
}

impl CooldownPolicy {
    /// Validates repair policy parameters
    pub fn validate(&self) -> Result<()> {
        if self.cooldown_ms == 0 {
            return Err(Error::Config(ConfigError::Message(
                "cooldown_ms cannot be 0 (every mismatch would hit live sources)".into(),
            )));
        }

        if self.live_timeout_ms == 0 {
            return Err(Error::Config(ConfigError::Message(
                "live_timeout_ms cannot be 0".into(),
            )));
        }

        Ok(())
    }
}

fn default_cooldown_ms() -> u64 {
    30_000
}

fn default_live_timeout_ms() -> u64 {
    3_000
}
