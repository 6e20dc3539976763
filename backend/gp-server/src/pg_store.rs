use gp_jobs::{AuditJob, AuditStore, EmbeddingStore, JobError, Result as JobErrorResult};

use async_trait::async_trait;
use sqlx::PgPool;

/// Postgres persistence for embeddings and the audit trail.
///
/// Expects `nodes(tenant_id, id, embedding vector, ...)` and
/// `audit_log(tenant_id, action, entity_type, entity_id, actor, detail jsonb, ...)`.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Text form accepted by a `::vector` cast, e.g. `[0.5,-1]`
pub fn vector_literal(vector: &[f32]) -> String {
    let parts: Vec<String> = vector.iter().map(f32::to_string).collect();
    format!("[{}]", parts.join(","))
}

#[async_trait]
impl EmbeddingStore for PgStore {
    async fn update_node_embedding(
        &self,
        tenant_id: &str,
        node_id: &str,
        vector: &[f32],
    ) -> JobErrorResult<()> {
        let result = sqlx::query(
            "UPDATE nodes SET embedding = $1::vector WHERE tenant_id = $2 AND id = $3",
        )
        .bind(vector_literal(vector))
        .bind(tenant_id)
        .bind(node_id)
        .execute(&self.pool)
        .await
        .map_err(|e| JobError::persistence(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(JobError::persistence(format!(
                "node {} not found for tenant {}",
                node_id, tenant_id
            )));
        }

        Ok(())
    }
}

#[async_trait]
impl AuditStore for PgStore {
    async fn record_audit(&self, entry: &AuditJob) -> JobErrorResult<()> {
        sqlx::query(
            "INSERT INTO audit_log (tenant_id, action, entity_type, entity_id, actor, detail) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(&entry.tenant_id)
        .bind(&entry.action)
        .bind(&entry.entity_type)
        .bind(&entry.entity_id)
        .bind(&entry.actor)
        .bind(&entry.detail)
        .execute(&self.pool)
        .await
        .map_err(|e| JobError::persistence(e.to_string()))?;

        Ok(())
    }
}
