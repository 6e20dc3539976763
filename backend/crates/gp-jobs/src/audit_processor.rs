use crate::{AuditJob, AuditStore, JobProcessor, Result as JobErrorResult};

use std::sync::Arc;

use async_trait::async_trait;
use log::warn;
use tokio_util::sync::CancellationToken;

pub const POOL_NAME: &str = "audit";

/// Persists audit entries. Single attempt; failures are logged and dropped.
pub struct AuditProcessor {
    store: Arc<dyn AuditStore>,
}

impl AuditProcessor {
    pub fn new(store: Arc<dyn AuditStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl JobProcessor for AuditProcessor {
    type Job = AuditJob;

    fn name(&self) -> &'static str {
        POOL_NAME
    }

    async fn process(&self, job: AuditJob, _cancel: &CancellationToken) -> JobErrorResult<()> {
        self.store.record_audit(&job).await.inspect_err(|e| {
            warn!(
                "Audit entry '{}' on {} {} (tenant {}) not recorded: {}",
                job.action, job.entity_type, job.entity_id, job.tenant_id, e
            );
        })
    }
}
