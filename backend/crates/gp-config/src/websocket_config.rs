use crate::{ConfigError, ConfigErrorResult};

use serde::Deserialize;

// Send buffer size constraints
pub const MIN_SEND_BUFFER_SIZE: usize = 1;
pub const MAX_SEND_BUFFER_SIZE: usize = 10000;
pub const DEFAULT_SEND_BUFFER_SIZE: usize = 256;

// Ping interval constraints (seconds)
pub const MIN_PING_INTERVAL_SECS: u64 = 5;
pub const MAX_PING_INTERVAL_SECS: u64 = 300;
pub const DEFAULT_PING_INTERVAL_SECS: u64 = 30;

pub const MIN_MAX_MISSED_PONGS: u32 = 1;
pub const MAX_MAX_MISSED_PONGS: u32 = 10;
pub const DEFAULT_MAX_MISSED_PONGS: u32 = 2;

// Credential refresh constraints (seconds)
pub const MIN_CREDENTIAL_REFRESH_SECS: u64 = 30;
pub const MAX_CREDENTIAL_REFRESH_SECS: u64 = 24 * 3600;
pub const DEFAULT_CREDENTIAL_REFRESH_SECS: u64 = 15 * 60;

pub const MIN_CREDENTIAL_TIMEOUT_SECS: u64 = 1;
pub const MAX_CREDENTIAL_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_CREDENTIAL_TIMEOUT_SECS: u64 = 10;

// Hard connection lifetime (seconds)
pub const MIN_MAX_LIFETIME_SECS: u64 = 60;
pub const MAX_MAX_LIFETIME_SECS: u64 = 7 * 24 * 3600;
pub const DEFAULT_MAX_LIFETIME_SECS: u64 = 4 * 3600;

// Inbound control messages per second
pub const MIN_RATE_LIMIT_PER_SEC: u32 = 1;
pub const MAX_RATE_LIMIT_PER_SEC: u32 = 1000;
pub const DEFAULT_RATE_LIMIT_PER_SEC: u32 = 10;

/// WebSocket connection settings.
/// All values validated to be within reasonable operational ranges.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WebSocketConfig {
    /// Outbound queue capacity per connection
    pub send_buffer_size: usize,
    /// Ping interval in seconds
    pub ping_interval_secs: u64,
    /// Consecutive unanswered pings before the connection is closed
    pub max_missed_pongs: u32,
    /// Credential re-validation period in seconds
    pub credential_refresh_secs: u64,
    /// Timeout for a single credential re-validation
    pub credential_timeout_secs: u64,
    /// Hard upper bound on connection lifetime
    pub max_lifetime_secs: u64,
    /// Inbound control messages allowed per second
    pub rate_limit_per_sec: u32,
}

impl Default for WebSocketConfig {
    fn default() -> Self {
        Self {
            send_buffer_size: DEFAULT_SEND_BUFFER_SIZE,
            ping_interval_secs: DEFAULT_PING_INTERVAL_SECS,
            max_missed_pongs: DEFAULT_MAX_MISSED_PONGS,
            credential_refresh_secs: DEFAULT_CREDENTIAL_REFRESH_SECS,
            credential_timeout_secs: DEFAULT_CREDENTIAL_TIMEOUT_SECS,
            max_lifetime_secs: DEFAULT_MAX_LIFETIME_SECS,
            rate_limit_per_sec: DEFAULT_RATE_LIMIT_PER_SEC,
        }
    }
}

impl WebSocketConfig {
    /// Validate all fields are within acceptable ranges.
    pub fn validate(&self) -> ConfigErrorResult<()> {
        if self.send_buffer_size < MIN_SEND_BUFFER_SIZE
            || self.send_buffer_size > MAX_SEND_BUFFER_SIZE
        {
            return Err(ConfigError::config(format!(
                "websocket.send_buffer_size must be {}-{}, got {}",
                MIN_SEND_BUFFER_SIZE, MAX_SEND_BUFFER_SIZE, self.send_buffer_size
            )));
        }

        if self.ping_interval_secs < MIN_PING_INTERVAL_SECS
            || self.ping_interval_secs > MAX_PING_INTERVAL_SECS
        {
            return Err(ConfigError::config(format!(
                "websocket.ping_interval_secs must be {}-{}, got {}",
                MIN_PING_INTERVAL_SECS, MAX_PING_INTERVAL_SECS, self.ping_interval_secs
            )));
        }

        if self.max_missed_pongs < MIN_MAX_MISSED_PONGS
            || self.max_missed_pongs > MAX_MAX_MISSED_PONGS
        {
            return Err(ConfigError::config(format!(
                "websocket.max_missed_pongs must be {}-{}, got {}",
                MIN_MAX_MISSED_PONGS, MAX_MAX_MISSED_PONGS, self.max_missed_pongs
            )));
        }

        if self.credential_refresh_secs < MIN_CREDENTIAL_REFRESH_SECS
            || self.credential_refresh_secs > MAX_CREDENTIAL_REFRESH_SECS
        {
            return Err(ConfigError::config(format!(
                "websocket.credential_refresh_secs must be {}-{}, got {}",
                MIN_CREDENTIAL_REFRESH_SECS,
                MAX_CREDENTIAL_REFRESH_SECS,
                self.credential_refresh_secs
            )));
        }

        if self.credential_timeout_secs < MIN_CREDENTIAL_TIMEOUT_SECS
            || self.credential_timeout_secs > MAX_CREDENTIAL_TIMEOUT_SECS
        {
            return Err(ConfigError::config(format!(
                "websocket.credential_timeout_secs must be {}-{}, got {}",
                MIN_CREDENTIAL_TIMEOUT_SECS,
                MAX_CREDENTIAL_TIMEOUT_SECS,
                self.credential_timeout_secs
            )));
        }

        if self.credential_timeout_secs >= self.credential_refresh_secs {
            return Err(ConfigError::config(format!(
                "websocket.credential_timeout_secs ({}) must be less than credential_refresh_secs ({})",
                self.credential_timeout_secs, self.credential_refresh_secs
            )));
        }

        if self.max_lifetime_secs < MIN_MAX_LIFETIME_SECS
            || self.max_lifetime_secs > MAX_MAX_LIFETIME_SECS
        {
            return Err(ConfigError::config(format!(
                "websocket.max_lifetime_secs must be {}-{}, got {}",
                MIN_MAX_LIFETIME_SECS, MAX_MAX_LIFETIME_SECS, self.max_lifetime_secs
            )));
        }

        if self.rate_limit_per_sec < MIN_RATE_LIMIT_PER_SEC
            || self.rate_limit_per_sec > MAX_RATE_LIMIT_PER_SEC
        {
            return Err(ConfigError::config(format!(
                "websocket.rate_limit_per_sec must be {}-{}, got {}",
                MIN_RATE_LIMIT_PER_SEC, MAX_RATE_LIMIT_PER_SEC, self.rate_limit_per_sec
            )));
        }

        Ok(())
    }
}
