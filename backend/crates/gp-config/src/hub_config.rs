use crate::{ConfigError, ConfigErrorResult};

use serde::Deserialize;

// Admission limits
pub const MIN_MAX_TOTAL: usize = 1;
pub const MAX_MAX_TOTAL: usize = 100_000;
pub const DEFAULT_MAX_TOTAL: usize = 1000;

pub const MIN_MAX_PER_TENANT: usize = 1;
pub const DEFAULT_MAX_PER_TENANT: usize = 50;

// Hub input queues
pub const MIN_QUEUE_CAPACITY: usize = 1;
pub const MAX_QUEUE_CAPACITY: usize = 100_000;
pub const DEFAULT_REGISTER_QUEUE_CAPACITY: usize = 256;
pub const DEFAULT_BROADCAST_QUEUE_CAPACITY: usize = 1024;

// Broadcast payload cap (bytes)
pub const MIN_MAX_PAYLOAD_BYTES: usize = 256;
pub const MAX_MAX_PAYLOAD_BYTES: usize = 1024 * 1024;
pub const DEFAULT_MAX_PAYLOAD_BYTES: usize = 4096;

// Shutdown drain
pub const MIN_SHUTDOWN_TIMEOUT_MS: u64 = 100;
pub const MAX_SHUTDOWN_TIMEOUT_MS: u64 = 60_000;
pub const DEFAULT_SHUTDOWN_TIMEOUT_MS: u64 = 3000;
pub const MIN_SHUTDOWN_POLL_MS: u64 = 1;
pub const DEFAULT_SHUTDOWN_POLL_MS: u64 = 50;

/// Connection hub settings: admission control, queue sizes and drain timing.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HubConfig {
    /// Maximum connections across all tenants
    pub max_total: usize,
    /// Maximum connections for a single tenant
    pub max_per_tenant: usize,
    /// Pending registrations before new connections are refused
    pub register_queue_capacity: usize,
    /// Pending broadcasts before new ones are dropped
    pub broadcast_queue_capacity: usize,
    /// Broadcast payloads larger than this are dropped
    pub max_payload_bytes: usize,
    /// Upper bound on the shutdown drain phase
    pub shutdown_timeout_ms: u64,
    /// Outbound queue poll interval during the drain phase
    pub shutdown_poll_ms: u64,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            max_total: DEFAULT_MAX_TOTAL,
            max_per_tenant: DEFAULT_MAX_PER_TENANT,
            register_queue_capacity: DEFAULT_REGISTER_QUEUE_CAPACITY,
            broadcast_queue_capacity: DEFAULT_BROADCAST_QUEUE_CAPACITY,
            max_payload_bytes: DEFAULT_MAX_PAYLOAD_BYTES,
            shutdown_timeout_ms: DEFAULT_SHUTDOWN_TIMEOUT_MS,
            shutdown_poll_ms: DEFAULT_SHUTDOWN_POLL_MS,
        }
    }
}

impl HubConfig {
    pub fn validate(&self) -> ConfigErrorResult<()> {
        if self.max_total < MIN_MAX_TOTAL || self.max_total > MAX_MAX_TOTAL {
            return Err(ConfigError::config(format!(
                "hub.max_total must be {}-{}, got {}",
                MIN_MAX_TOTAL, MAX_MAX_TOTAL, self.max_total
            )));
        }

        if self.max_per_tenant < MIN_MAX_PER_TENANT || self.max_per_tenant > self.max_total {
            return Err(ConfigError::config(format!(
                "hub.max_per_tenant must be {}-{} (max_total), got {}",
                MIN_MAX_PER_TENANT, self.max_total, self.max_per_tenant
            )));
        }

        for (name, value) in [
            ("register_queue_capacity", self.register_queue_capacity),
            ("broadcast_queue_capacity", self.broadcast_queue_capacity),
        ] {
            if !(MIN_QUEUE_CAPACITY..=MAX_QUEUE_CAPACITY).contains(&value) {
                return Err(ConfigError::config(format!(
                    "hub.{} must be {}-{}, got {}",
                    name, MIN_QUEUE_CAPACITY, MAX_QUEUE_CAPACITY, value
                )));
            }
        }

        if self.max_payload_bytes < MIN_MAX_PAYLOAD_BYTES
            || self.max_payload_bytes > MAX_MAX_PAYLOAD_BYTES
        {
            return Err(ConfigError::config(format!(
                "hub.max_payload_bytes must be {}-{}, got {}",
                MIN_MAX_PAYLOAD_BYTES, MAX_MAX_PAYLOAD_BYTES, self.max_payload_bytes
            )));
        }

        if self.shutdown_timeout_ms < MIN_SHUTDOWN_TIMEOUT_MS
            || self.shutdown_timeout_ms > MAX_SHUTDOWN_TIMEOUT_MS
        {
            return Err(ConfigError::config(format!(
                "hub.shutdown_timeout_ms must be {}-{}, got {}",
                MIN_SHUTDOWN_TIMEOUT_MS, MAX_SHUTDOWN_TIMEOUT_MS, self.shutdown_timeout_ms
            )));
        }

        if self.shutdown_poll_ms < MIN_SHUTDOWN_POLL_MS
            || self.shutdown_poll_ms > self.shutdown_timeout_ms
        {
            return Err(ConfigError::config(format!(
                "hub.shutdown_poll_ms must be {}-{} (shutdown_timeout_ms), got {}",
                MIN_SHUTDOWN_POLL_MS, self.shutdown_timeout_ms, self.shutdown_poll_ms
            )));
        }

        Ok(())
    }
}
