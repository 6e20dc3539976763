use gp_config::WebSocketConfig;

use std::time::Duration;

/// Per-connection timing and limits
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// Outbound queue capacity
    pub send_buffer_size: usize,
    pub ping_interval: Duration,
    /// Consecutive unanswered pings tolerated before closing
    pub max_missed_pongs: u32,
    pub credential_refresh: Duration,
    pub credential_timeout: Duration,
    /// Hard cap on connection lifetime
    pub max_lifetime: Duration,
    /// Inbound control messages per second
    pub rate_limit_per_sec: u32,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self::from(&WebSocketConfig::default())
    }
}

impl From<&WebSocketConfig> for ConnectionConfig {
    fn from(config: &WebSocketConfig) -> Self {
        Self {
            send_buffer_size: config.send_buffer_size,
            ping_interval: Duration::from_secs(config.ping_interval_secs),
            max_missed_pongs: config.max_missed_pongs,
            credential_refresh: Duration::from_secs(config.credential_refresh_secs),
            credential_timeout: Duration::from_secs(config.credential_timeout_secs),
            max_lifetime: Duration::from_secs(config.max_lifetime_secs),
            rate_limit_per_sec: config.rate_limit_per_sec,
        }
    }
}
