use crate::{ConfigError, ConfigErrorResult};

use serde::Deserialize;

/// HS256 requires at least 32 bytes of key material
pub const MIN_JWT_SECRET_LENGTH: usize = 32;

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AuthConfig {
    /// Shared secret used to verify API keys (HS256 tokens)
    pub jwt_secret: Option<String>,
}

impl AuthConfig {
    pub fn validate(&self) -> ConfigErrorResult<()> {
        match &self.jwt_secret {
            None => Err(ConfigError::auth(
                "auth.jwt_secret is required (set GP_AUTH_JWT_SECRET)",
            )),
            Some(secret) if secret.len() < MIN_JWT_SECRET_LENGTH => {
                Err(ConfigError::auth(format!(
                    "auth.jwt_secret must be at least {} bytes, got {}",
                    MIN_JWT_SECRET_LENGTH,
                    secret.len()
                )))
            }
            Some(_) => Ok(()),
        }
    }
}
