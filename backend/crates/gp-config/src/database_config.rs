use crate::{ConfigError, ConfigErrorResult, DEFAULT_DATABASE_URL};

use serde::Deserialize;

pub const MIN_POOL_SIZE: u32 = 2;
pub const MAX_POOL_SIZE: u32 = 100;
pub const DEFAULT_POOL_SIZE: u32 = 10;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub url: String,
    /// Must leave room for the dedicated change feed listener connection
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: String::from(DEFAULT_DATABASE_URL),
            max_connections: DEFAULT_POOL_SIZE,
        }
    }
}

impl DatabaseConfig {
    pub fn validate(&self) -> ConfigErrorResult<()> {
        if !(self.url.starts_with("postgres://") || self.url.starts_with("postgresql://")) {
            return Err(ConfigError::database(
                "database.url must be a postgres:// or postgresql:// URL",
            ));
        }

        if self.max_connections < MIN_POOL_SIZE || self.max_connections > MAX_POOL_SIZE {
            return Err(ConfigError::database(format!(
                "database.max_connections must be {}-{}, got {}",
                MIN_POOL_SIZE, MAX_POOL_SIZE, self.max_connections
            )));
        }

        Ok(())
    }

    /// Connection URL with any password masked, for logging
    pub fn redacted_url(&self) -> String {
        match (self.url.find("://"), self.url.rfind('@')) {
            (Some(scheme_end), Some(at)) if at > scheme_end => {
                let credentials = &self.url[scheme_end + 3..at];
                let user = credentials.split(':').next().unwrap_or_default();
                format!("{}{}:***{}", &self.url[..scheme_end + 3], user, &self.url[at..])
            }
            _ => self.url.clone(),
        }
    }
}
