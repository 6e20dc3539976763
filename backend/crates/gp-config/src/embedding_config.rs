use crate::{ConfigError, ConfigErrorResult};

use serde::Deserialize;

pub const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:11434/api/embed";
pub const DEFAULT_MODEL: &str = "nomic-embed-text";

pub const MIN_TIMEOUT_SECS: u64 = 1;
pub const MAX_TIMEOUT_SECS: u64 = 600;
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

pub const MIN_QUEUE_CAPACITY: usize = 1;
pub const MAX_QUEUE_CAPACITY: usize = 100_000;
pub const DEFAULT_QUEUE_CAPACITY: usize = 1000;

pub const MIN_CONCURRENCY: usize = 1;
pub const MAX_CONCURRENCY: usize = 64;
pub const DEFAULT_CONCURRENCY: usize = 2;

pub const MIN_MAX_ATTEMPTS: u32 = 1;
pub const MAX_MAX_ATTEMPTS: u32 = 10;
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

pub const MIN_RETRY_BASE_SECS: u64 = 1;
pub const MAX_RETRY_BASE_SECS: u64 = 60;
pub const DEFAULT_RETRY_BASE_SECS: u64 = 2;

/// Embedding pipeline settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub enabled: bool,
    /// Loopback-only HTTP endpoint accepting `{model, input}`
    pub endpoint: String,
    pub model: String,
    /// Per-request timeout
    pub timeout_secs: u64,
    pub queue_capacity: usize,
    pub concurrency: usize,
    /// Attempts per job, including the first
    pub max_attempts: u32,
    /// Delay after the first failed attempt; doubles after each failure
    pub retry_base_secs: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            endpoint: String::from(DEFAULT_ENDPOINT),
            model: String::from(DEFAULT_MODEL),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            concurrency: DEFAULT_CONCURRENCY,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            retry_base_secs: DEFAULT_RETRY_BASE_SECS,
        }
    }
}

impl EmbeddingConfig {
    pub fn validate(&self) -> ConfigErrorResult<()> {
        if !(self.endpoint.starts_with("http://") || self.endpoint.starts_with("https://")) {
            return Err(ConfigError::embedding(format!(
                "embedding.endpoint must be an http(s) URL, got {}",
                self.endpoint
            )));
        }

        if self.model.trim().is_empty() {
            return Err(ConfigError::embedding("embedding.model cannot be empty"));
        }

        if self.timeout_secs < MIN_TIMEOUT_SECS || self.timeout_secs > MAX_TIMEOUT_SECS {
            return Err(ConfigError::embedding(format!(
                "embedding.timeout_secs must be {}-{}, got {}",
                MIN_TIMEOUT_SECS, MAX_TIMEOUT_SECS, self.timeout_secs
            )));
        }

        if self.queue_capacity < MIN_QUEUE_CAPACITY || self.queue_capacity > MAX_QUEUE_CAPACITY {
            return Err(ConfigError::embedding(format!(
                "embedding.queue_capacity must be {}-{}, got {}",
                MIN_QUEUE_CAPACITY, MAX_QUEUE_CAPACITY, self.queue_capacity
            )));
        }

        if self.concurrency < MIN_CONCURRENCY || self.concurrency > MAX_CONCURRENCY {
            return Err(ConfigError::embedding(format!(
                "embedding.concurrency must be {}-{}, got {}",
                MIN_CONCURRENCY, MAX_CONCURRENCY, self.concurrency
            )));
        }

        if self.max_attempts < MIN_MAX_ATTEMPTS || self.max_attempts > MAX_MAX_ATTEMPTS {
            return Err(ConfigError::embedding(format!(
                "embedding.max_attempts must be {}-{}, got {}",
                MIN_MAX_ATTEMPTS, MAX_MAX_ATTEMPTS, self.max_attempts
            )));
        }

        if self.retry_base_secs < MIN_RETRY_BASE_SECS || self.retry_base_secs > MAX_RETRY_BASE_SECS
        {
            return Err(ConfigError::embedding(format!(
                "embedding.retry_base_secs must be {}-{}, got {}",
                MIN_RETRY_BASE_SECS, MAX_RETRY_BASE_SECS, self.retry_base_secs
            )));
        }

        Ok(())
    }
}
