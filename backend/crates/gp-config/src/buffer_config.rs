use crate::{ConfigError, ConfigErrorResult};

use serde::Deserialize;

pub const MIN_MAX_LEN: usize = 1;
pub const MAX_MAX_LEN: usize = 1_000_000;
pub const DEFAULT_MAX_LEN: usize = 1000;

pub const MIN_MAX_AGE_SECS: u64 = 1;
pub const MAX_MAX_AGE_SECS: u64 = 7 * 24 * 3600;
pub const DEFAULT_MAX_AGE_SECS: u64 = 3600;

pub const MIN_SWEEP_INTERVAL_SECS: u64 = 1;
pub const MAX_SWEEP_INTERVAL_SECS: u64 = 24 * 3600;
pub const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 600;

/// Replay buffer retention per tenant.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BufferConfig {
    /// Events kept per tenant
    pub max_len: usize,
    /// Oldest event age kept, in seconds
    pub max_age_secs: u64,
    /// Idle tenant sweep period, in seconds
    pub sweep_interval_secs: u64,
}

impl Default for BufferConfig {
    fn default() -> Self {
        Self {
            max_len: DEFAULT_MAX_LEN,
            max_age_secs: DEFAULT_MAX_AGE_SECS,
            sweep_interval_secs: DEFAULT_SWEEP_INTERVAL_SECS,
        }
    }
}

impl BufferConfig {
    pub fn validate(&self) -> ConfigErrorResult<()> {
        if self.max_len < MIN_MAX_LEN || self.max_len > MAX_MAX_LEN {
            return Err(ConfigError::config(format!(
                "buffer.max_len must be {}-{}, got {}",
                MIN_MAX_LEN, MAX_MAX_LEN, self.max_len
            )));
        }

        if self.max_age_secs < MIN_MAX_AGE_SECS || self.max_age_secs > MAX_MAX_AGE_SECS {
            return Err(ConfigError::config(format!(
                "buffer.max_age_secs must be {}-{}, got {}",
                MIN_MAX_AGE_SECS, MAX_MAX_AGE_SECS, self.max_age_secs
            )));
        }

        if self.sweep_interval_secs < MIN_SWEEP_INTERVAL_SECS
            || self.sweep_interval_secs > MAX_SWEEP_INTERVAL_SECS
        {
            return Err(ConfigError::config(format!(
                "buffer.sweep_interval_secs must be {}-{}, got {}",
                MIN_SWEEP_INTERVAL_SECS, MAX_SWEEP_INTERVAL_SECS, self.sweep_interval_secs
            )));
        }

        Ok(())
    }
}
