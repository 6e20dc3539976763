use gp_jobs::{
    AuditJob, AuditProcessor, EmbedJob, EmbedProcessor, JobError, Result as JobErrorResult,
    WorkerPool,
};

use std::panic::Location;

use error_location::ErrorLocation;
use log::{debug, info, warn};

/// Entry points for side effects that must stay off the request path.
///
/// The graph mutation handlers that enqueue embedding and audit jobs are not
/// served by this binary. They call `enqueue_embedding` and `enqueue_audit`
/// after a committed write; within this crate only the tests reach them.
pub struct JobQueues {
    embedding: Option<WorkerPool<EmbedProcessor>>,
    audit: WorkerPool<AuditProcessor>,
}

impl JobQueues {
    /// `embedding` is None when embedding generation is disabled
    pub fn new(
        embedding: Option<WorkerPool<EmbedProcessor>>,
        audit: WorkerPool<AuditProcessor>,
    ) -> Self {
        Self { embedding, audit }
    }

    /// Queue an embedding job. Dropped with a warning when the queue is full.
    ///
    /// Called by node mutation handlers outside this service.
    pub fn enqueue_embedding(&self, job: EmbedJob) -> JobErrorResult<()> {
        let Some(pool) = &self.embedding else {
            debug!("Embedding disabled, skipping node {}", job.node_id);
            return Err(JobError::PoolStopped {
                pool: gp_jobs::embed_processor::POOL_NAME,
                location: ErrorLocation::from(Location::caller()),
            });
        };

        pool.enqueue(job)
            .inspect_err(|e| warn!("Embedding job not queued: {}", e))
    }

    /// Queue an audit entry. Dropped with a warning when the queue is full.
    ///
    /// Called by graph mutation handlers outside this service.
    pub fn enqueue_audit(&self, job: AuditJob) -> JobErrorResult<()> {
        self.audit
            .enqueue(job)
            .inspect_err(|e| warn!("Audit entry not queued: {}", e))
    }

    pub fn embedding_depth(&self) -> Option<usize> {
        self.embedding.as_ref().map(WorkerPool::queue_depth)
    }

    pub fn audit_depth(&self) -> usize {
        self.audit.queue_depth()
    }

    /// Stop both pools after a best-effort drain
    pub async fn shutdown(&self) {
        if let Some(pool) = &self.embedding {
            pool.shutdown().await;
        }
        self.audit.shutdown().await;
        info!("Job queues stopped");
    }
}
