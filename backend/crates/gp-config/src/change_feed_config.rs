use crate::{ConfigError, ConfigErrorResult};

use serde::Deserialize;

pub const DEFAULT_CHANNEL: &str = "graph_changes";

pub const MIN_WAIT_DEADLINE_SECS: u64 = 1;
pub const MAX_WAIT_DEADLINE_SECS: u64 = 3600;
pub const DEFAULT_WAIT_DEADLINE_SECS: u64 = 120;

pub const MIN_BACKOFF_BASE_MS: u64 = 10;
pub const MAX_BACKOFF_BASE_MS: u64 = 60_000;
pub const DEFAULT_BACKOFF_BASE_MS: u64 = 1000;

pub const MIN_BACKOFF_MAX_SECS: u64 = 1;
pub const MAX_BACKOFF_MAX_SECS: u64 = 600;
pub const DEFAULT_BACKOFF_MAX_SECS: u64 = 30;

pub const MIN_JITTER: f64 = 0.0;
pub const MAX_JITTER: f64 = 0.9;
pub const DEFAULT_JITTER: f64 = 0.25;

/// Change feed listener settings.
///
/// The channel name is interpolated into a LISTEN statement, so only plain
/// identifiers are accepted.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ChangeFeedConfig {
    /// Postgres notification channel
    pub channel: String,
    /// Rolling wait deadline between cancellation checks
    pub wait_deadline_secs: u64,
    /// First reconnect delay in milliseconds
    pub backoff_base_ms: u64,
    /// Reconnect delay cap in seconds
    pub backoff_max_secs: u64,
    /// Fractional jitter applied to every reconnect delay
    pub jitter: f64,
}

impl Default for ChangeFeedConfig {
    fn default() -> Self {
        Self {
            channel: String::from(DEFAULT_CHANNEL),
            wait_deadline_secs: DEFAULT_WAIT_DEADLINE_SECS,
            backoff_base_ms: DEFAULT_BACKOFF_BASE_MS,
            backoff_max_secs: DEFAULT_BACKOFF_MAX_SECS,
            jitter: DEFAULT_JITTER,
        }
    }
}

impl ChangeFeedConfig {
    pub fn validate(&self) -> ConfigErrorResult<()> {
        if self.channel.is_empty() {
            return Err(ConfigError::change_feed("change_feed.channel cannot be empty"));
        }

        if self.wait_deadline_secs < MIN_WAIT_DEADLINE_SECS
            || self.wait_deadline_secs > MAX_WAIT_DEADLINE_SECS
        {
            return Err(ConfigError::change_feed(format!(
                "change_feed.wait_deadline_secs must be {}-{}, got {}",
                MIN_WAIT_DEADLINE_SECS, MAX_WAIT_DEADLINE_SECS, self.wait_deadline_secs
            )));
        }

        if self.backoff_base_ms < MIN_BACKOFF_BASE_MS || self.backoff_base_ms > MAX_BACKOFF_BASE_MS
        {
            return Err(ConfigError::change_feed(format!(
                "change_feed.backoff_base_ms must be {}-{}, got {}",
                MIN_BACKOFF_BASE_MS, MAX_BACKOFF_BASE_MS, self.backoff_base_ms
            )));
        }

        if self.backoff_max_secs < MIN_BACKOFF_MAX_SECS
            || self.backoff_max_secs > MAX_BACKOFF_MAX_SECS
        {
            return Err(ConfigError::change_feed(format!(
                "change_feed.backoff_max_secs must be {}-{}, got {}",
                MIN_BACKOFF_MAX_SECS, MAX_BACKOFF_MAX_SECS, self.backoff_max_secs
            )));
        }

        if self.backoff_max_secs * 1000 < self.backoff_base_ms {
            return Err(ConfigError::change_feed(format!(
                "change_feed.backoff_max_secs ({}s) must not be below backoff_base_ms ({}ms)",
                self.backoff_max_secs, self.backoff_base_ms
            )));
        }

        if !(MIN_JITTER..=MAX_JITTER).contains(&self.jitter) {
            return Err(ConfigError::change_feed(format!(
                "change_feed.jitter must be {}-{}, got {}",
                MIN_JITTER, MAX_JITTER, self.jitter
            )));
        }

        Ok(())
    }
}
