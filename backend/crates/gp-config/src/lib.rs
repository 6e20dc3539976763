mod audit_config;
mod auth_config;
mod buffer_config;
mod change_feed_config;
mod circuit_breaker_config;
mod config;
mod database_config;
mod embedding_config;
mod error;
mod hub_config;
mod log_level;
mod logging_config;
mod server_config;
mod websocket_config;

pub use audit_config::AuditConfig;
pub use auth_config::AuthConfig;
pub use buffer_config::BufferConfig;
pub use change_feed_config::ChangeFeedConfig;
pub use circuit_breaker_config::CircuitBreakerConfig;
pub use config::Config;
pub use database_config::DatabaseConfig;
pub use embedding_config::EmbeddingConfig;
pub use error::{ConfigError, ConfigErrorResult};
pub use hub_config::HubConfig;
pub use log_level::LogLevel;
pub use logging_config::LoggingConfig;
pub use server_config::ServerConfig;
pub use websocket_config::WebSocketConfig;

#[cfg(test)]
mod tests;

const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 8000;
const MIN_PORT: u16 = 1024;
const DEFAULT_DATABASE_URL: &str = "postgres://localhost:5432/graph";
const DEFAULT_LOG_LEVEL_STRING: &str = "info";
const DEFAULT_LOG_LEVEL: log::LevelFilter = log::LevelFilter::Info;
const DEFAULT_LOG_DIRECTORY: &str = "log";
const DEFAULT_CONFIG_DIR_NAME: &str = ".gp";
const CONFIG_DIR_ENV: &str = "GP_CONFIG_DIR";
