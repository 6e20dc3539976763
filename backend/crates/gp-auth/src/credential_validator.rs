use crate::Result as AuthErrorResult;

use async_trait::async_trait;

/// Resolves an API key to the tenant it belongs to.
///
/// Called once before a connection is admitted and again on every periodic
/// credential refresh, so implementations may be remote.
#[async_trait]
pub trait CredentialValidator: Send + Sync {
    async fn validate(&self, api_key: &str) -> AuthErrorResult<String>;
}
