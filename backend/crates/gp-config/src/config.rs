use crate::{
    AuditConfig, AuthConfig, BufferConfig, CONFIG_DIR_ENV, ChangeFeedConfig, CircuitBreakerConfig,
    ConfigError, ConfigErrorResult, DEFAULT_CONFIG_DIR_NAME, DatabaseConfig, EmbeddingConfig,
    HubConfig, LoggingConfig, ServerConfig, WebSocketConfig,
};

use std::path::{Path, PathBuf};

use log::info;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub logging: LoggingConfig,
    pub hub: HubConfig,
    pub buffer: BufferConfig,
    pub websocket: WebSocketConfig,
    pub change_feed: ChangeFeedConfig,
    pub embedding: EmbeddingConfig,
    pub audit: AuditConfig,
    pub circuit_breaker: CircuitBreakerConfig,
}

impl Config {
    /// Load config.
    ///
    /// Loading order:
    /// 1. Check for GP_CONFIG_DIR env var, else use ./.gp/
    /// 2. Load config.toml if it exists, else use defaults
    /// 3. Apply GP_* environment variable overrides
    ///
    /// Does NOT validate - call validate() after load().
    pub fn load() -> ConfigErrorResult<Self> {
        let config_path = Self::config_dir()?.join("config.toml");

        let mut config = if config_path.exists() {
            Self::load_toml(&config_path)?
        } else {
            Config::default()
        };

        config.apply_env_overrides();

        Ok(config)
    }

    /// Load and parse TOML file with detailed error context.
    fn load_toml(path: &Path) -> ConfigErrorResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&contents).map_err(|e| ConfigError::Toml {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Get the config directory.
    /// Priority: GP_CONFIG_DIR env var > ./.gp/ (relative to cwd)
    pub fn config_dir() -> ConfigErrorResult<PathBuf> {
        if let Ok(dir) = std::env::var(CONFIG_DIR_ENV) {
            return Ok(PathBuf::from(dir));
        }

        let cwd = std::env::current_dir()
            .map_err(|_| ConfigError::config("Cannot determine current working directory"))?;
        Ok(cwd.join(DEFAULT_CONFIG_DIR_NAME))
    }

    /// Validate all configuration.
    /// Call after load() to catch all errors at startup.
    pub fn validate(&self) -> ConfigErrorResult<()> {
        self.server.validate()?;
        self.database.validate()?;
        self.auth.validate()?;
        self.hub.validate()?;
        self.buffer.validate()?;
        self.websocket.validate()?;
        self.change_feed.validate()?;
        self.embedding.validate()?;
        self.audit.validate()?;
        self.circuit_breaker.validate()?;

        Ok(())
    }

    /// Get bind address as string.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Log configuration summary (NEVER logs secrets).
    pub fn log_summary(&self) {
        info!("Configuration loaded:");
        info!("  server: {}:{}", self.server.host, self.server.port);
        info!(
            "  database: {} (pool {})",
            self.database.redacted_url(),
            self.database.max_connections
        );
        info!(
            "  auth: {}",
            if self.auth.jwt_secret.is_some() {
                "HS256"
            } else {
                "unconfigured"
            }
        );
        info!("  logging: {}", *self.logging.level);

        info!(
            "  hub: max {} total / {} per tenant, payload <= {}B, drain {}ms",
            self.hub.max_total,
            self.hub.max_per_tenant,
            self.hub.max_payload_bytes,
            self.hub.shutdown_timeout_ms
        );

        info!(
            "  buffer: len={}, age={}s, sweep={}s",
            self.buffer.max_len, self.buffer.max_age_secs, self.buffer.sweep_interval_secs
        );

        info!(
            "  websocket: buffer={}, ping={}s x{}, refresh={}s, lifetime={}s",
            self.websocket.send_buffer_size,
            self.websocket.ping_interval_secs,
            self.websocket.max_missed_pongs,
            self.websocket.credential_refresh_secs,
            self.websocket.max_lifetime_secs
        );

        info!(
            "  change_feed: channel={}, backoff={}ms..{}s (jitter {})",
            self.change_feed.channel,
            self.change_feed.backoff_base_ms,
            self.change_feed.backoff_max_secs,
            self.change_feed.jitter
        );

        info!(
            "  embedding: {} model={} queue={} workers={} attempts={}",
            if self.embedding.enabled {
                self.embedding.endpoint.as_str()
            } else {
                "disabled"
            },
            self.embedding.model,
            self.embedding.queue_capacity,
            self.embedding.concurrency,
            self.embedding.max_attempts
        );

        info!(
            "  audit: queue={} workers={}",
            self.audit.queue_capacity, self.audit.concurrency
        );

        info!(
            "  circuit_breaker: threshold={}, open={}s",
            self.circuit_breaker.failure_threshold, self.circuit_breaker.open_duration_secs
        );
    }

    fn apply_env_overrides(&mut self) {
        // Server
        Self::apply_env_string("GP_SERVER_HOST", &mut self.server.host);
        Self::apply_env_parse("GP_SERVER_PORT", &mut self.server.port);

        // Database
        Self::apply_env_string("GP_DATABASE_URL", &mut self.database.url);
        Self::apply_env_parse(
            "GP_DATABASE_MAX_CONNECTIONS",
            &mut self.database.max_connections,
        );

        // Auth
        Self::apply_env_option_string("GP_AUTH_JWT_SECRET", &mut self.auth.jwt_secret);

        // Logging
        Self::apply_env_parse("GP_LOG_LEVEL", &mut self.logging.level);
        Self::apply_env_bool("GP_LOG_COLORED", &mut self.logging.colored);
        Self::apply_env_option_string("GP_LOG_FILE", &mut self.logging.file);

        // Hub
        Self::apply_env_parse("GP_HUB_MAX_TOTAL", &mut self.hub.max_total);
        Self::apply_env_parse("GP_HUB_MAX_PER_TENANT", &mut self.hub.max_per_tenant);
        Self::apply_env_parse(
            "GP_HUB_MAX_PAYLOAD_BYTES",
            &mut self.hub.max_payload_bytes,
        );
        Self::apply_env_parse(
            "GP_HUB_SHUTDOWN_TIMEOUT_MS",
            &mut self.hub.shutdown_timeout_ms,
        );

        // Buffer
        Self::apply_env_parse("GP_BUFFER_MAX_LEN", &mut self.buffer.max_len);
        Self::apply_env_parse("GP_BUFFER_MAX_AGE_SECS", &mut self.buffer.max_age_secs);
        Self::apply_env_parse(
            "GP_BUFFER_SWEEP_INTERVAL_SECS",
            &mut self.buffer.sweep_interval_secs,
        );

        // WebSocket
        Self::apply_env_parse(
            "GP_WS_SEND_BUFFER_SIZE",
            &mut self.websocket.send_buffer_size,
        );
        Self::apply_env_parse(
            "GP_WS_PING_INTERVAL_SECS",
            &mut self.websocket.ping_interval_secs,
        );
        Self::apply_env_parse(
            "GP_WS_MAX_MISSED_PONGS",
            &mut self.websocket.max_missed_pongs,
        );
        Self::apply_env_parse(
            "GP_WS_CREDENTIAL_REFRESH_SECS",
            &mut self.websocket.credential_refresh_secs,
        );
        Self::apply_env_parse(
            "GP_WS_CREDENTIAL_TIMEOUT_SECS",
            &mut self.websocket.credential_timeout_secs,
        );
        Self::apply_env_parse(
            "GP_WS_MAX_LIFETIME_SECS",
            &mut self.websocket.max_lifetime_secs,
        );
        Self::apply_env_parse(
            "GP_WS_RATE_LIMIT_PER_SEC",
            &mut self.websocket.rate_limit_per_sec,
        );

        // Change feed
        Self::apply_env_string("GP_FEED_CHANNEL", &mut self.change_feed.channel);
        Self::apply_env_parse(
            "GP_FEED_WAIT_DEADLINE_SECS",
            &mut self.change_feed.wait_deadline_secs,
        );
        Self::apply_env_parse(
            "GP_FEED_BACKOFF_BASE_MS",
            &mut self.change_feed.backoff_base_ms,
        );
        Self::apply_env_parse(
            "GP_FEED_BACKOFF_MAX_SECS",
            &mut self.change_feed.backoff_max_secs,
        );
        Self::apply_env_parse("GP_FEED_JITTER", &mut self.change_feed.jitter);

        // Embedding
        Self::apply_env_bool("GP_EMBED_ENABLED", &mut self.embedding.enabled);
        Self::apply_env_string("GP_EMBED_ENDPOINT", &mut self.embedding.endpoint);
        Self::apply_env_string("GP_EMBED_MODEL", &mut self.embedding.model);
        Self::apply_env_parse("GP_EMBED_TIMEOUT_SECS", &mut self.embedding.timeout_secs);
        Self::apply_env_parse(
            "GP_EMBED_QUEUE_CAPACITY",
            &mut self.embedding.queue_capacity,
        );
        Self::apply_env_parse("GP_EMBED_CONCURRENCY", &mut self.embedding.concurrency);
        Self::apply_env_parse("GP_EMBED_MAX_ATTEMPTS", &mut self.embedding.max_attempts);
        Self::apply_env_parse(
            "GP_EMBED_RETRY_BASE_SECS",
            &mut self.embedding.retry_base_secs,
        );

        // Audit
        Self::apply_env_parse("GP_AUDIT_QUEUE_CAPACITY", &mut self.audit.queue_capacity);
        Self::apply_env_parse("GP_AUDIT_CONCURRENCY", &mut self.audit.concurrency);

        // Circuit Breaker
        Self::apply_env_parse(
            "GP_CB_FAILURE_THRESHOLD",
            &mut self.circuit_breaker.failure_threshold,
        );
        Self::apply_env_parse(
            "GP_CB_OPEN_DURATION_SECS",
            &mut self.circuit_breaker.open_duration_secs,
        );
    }

    /// Helper: Apply environment variable override for String values
    fn apply_env_string(var_name: &str, target: &mut String) {
        if let Ok(val) = std::env::var(var_name) {
            *target = val;
        }
    }

    /// Helper: Apply environment variable override for bool values (accepts "true"/"1")
    fn apply_env_bool(var_name: &str, target: &mut bool) {
        if let Ok(val) = std::env::var(var_name) {
            *target = val == "true" || val == "1";
        }
    }

    /// Helper: Apply environment variable override for parseable values
    fn apply_env_parse<T: std::str::FromStr>(var_name: &str, target: &mut T) {
        if let Ok(val) = std::env::var(var_name)
            && let Ok(parsed) = val.parse()
        {
            *target = parsed;
        }
    }

    /// Helper: Apply environment variable override for Option<String> values
    fn apply_env_option_string(var_name: &str, target: &mut Option<String>) {
        if let Ok(val) = std::env::var(var_name) {
            *target = Some(val);
        }
    }
}
