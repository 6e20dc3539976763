use crate::{AuditJob, Result as JobErrorResult};

use async_trait::async_trait;

/// Produces a vector for a piece of text
#[async_trait]
pub trait EmbeddingBackend: Send + Sync {
    async fn embed(&self, input: &str) -> JobErrorResult<Vec<f32>>;
}

#[async_trait]
pub trait EmbeddingStore: Send + Sync {
    async fn update_node_embedding(
        &self,
        tenant_id: &str,
        node_id: &str,
        vector: &[f32],
    ) -> JobErrorResult<()>;
}

#[async_trait]
pub trait AuditStore: Send + Sync {
    async fn record_audit(&self, entry: &AuditJob) -> JobErrorResult<()>;
}
